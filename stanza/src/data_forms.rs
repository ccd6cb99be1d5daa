// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::element::Element;
use crate::error::Error;
use crate::ns;

generate_attribute!(
    /// The role of a form within an exchange.
    DataFormType, "type", {
        /// The form-processing entity is asking for this form to be filled.
        Form => "form",

        /// A filled form being submitted.
        Submit => "submit",

        /// The submitting entity cancelled.
        Cancel => "cancel",

        /// Data results, e.g. a service info extension.
        Result_ => "result",
    }
);

/// One field of a data form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    /// The field name.
    pub var: Option<String>,
    /// The field type as sent, unvalidated.
    pub type_: Option<String>,
    /// The values of this field.
    pub values: Vec<String>,
}

impl Field {
    /// Creates a single-valued field.
    pub fn new<V: Into<String>, S: Into<String>>(var: V, value: S) -> Field {
        Field {
            var: Some(var.into()),
            type_: None,
            values: vec![value.into()],
        }
    }
}

impl TryFrom<Element> for Field {
    type Error = Error;

    fn try_from(elem: Element) -> Result<Field, Error> {
        let elem = crate::util::check_element(elem, "field", ns::DATA_FORMS)?;
        let var = elem.attr("var").map(String::from);
        let type_ = elem.attr("type").map(String::from);
        let mut values = Vec::new();
        for child in elem.children() {
            if child.is("value", ns::DATA_FORMS) {
                values.push(child.text());
            }
        }
        Ok(Field { var, type_, values })
    }
}

impl From<Field> for Element {
    fn from(field: Field) -> Element {
        let mut elem = Element::builder("field", ns::DATA_FORMS)
            .attr("var", field.var)
            .attr("type", field.type_)
            .build();
        for value in field.values {
            elem.append_child(Element::bare("value", ns::DATA_FORMS))
                .append_text_node(value);
        }
        elem
    }
}

/// A `jabber:x:data` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataForm {
    /// The form type.
    pub type_: DataFormType,
    /// The `FORM_TYPE` hidden field value, when present.
    pub form_type: Option<String>,
    /// The fields, `FORM_TYPE` excluded.
    pub fields: Vec<Field>,
}

impl DataForm {
    /// Creates a result form with the given `FORM_TYPE`.
    pub fn result<S: Into<String>>(form_type: S, fields: Vec<Field>) -> DataForm {
        DataForm {
            type_: DataFormType::Result_,
            form_type: Some(form_type.into()),
            fields,
        }
    }
}

impl TryFrom<Element> for DataForm {
    type Error = Error;

    fn try_from(elem: Element) -> Result<DataForm, Error> {
        let elem = crate::util::check_element(elem, "x", ns::DATA_FORMS)?;
        let type_ = get_attr!(elem, "type", Required);
        let mut form_type = None;
        let mut fields = Vec::new();
        for child in elem.children() {
            if !child.is("field", ns::DATA_FORMS) {
                continue;
            }
            let field = Field::try_from(child.clone()).map_err(Error::hide_type_mismatch)?;
            if field.var.as_deref() == Some("FORM_TYPE") {
                form_type = field.values.first().cloned();
            } else {
                fields.push(field);
            }
        }
        Ok(DataForm {
            type_,
            form_type,
            fields,
        })
    }
}

impl From<DataForm> for Element {
    fn from(form: DataForm) -> Element {
        let mut elem = Element::builder("x", ns::DATA_FORMS)
            .attr("type", form.type_)
            .build();
        if let Some(form_type) = form.form_type {
            let mut field = Field::new("FORM_TYPE", form_type);
            field.type_ = Some("hidden".to_owned());
            elem.append_child(field.into());
        }
        for field in form.fields {
            elem.append_child(field.into());
        }
        elem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_form() {
        let elem: Element = "<x xmlns='jabber:x:data' type='result'>\
             <field var='FORM_TYPE' type='hidden'><value>urn:xmpp:dataforms:softwareinfo</value></field>\
             <field var='os'><value>Mac</value></field>\
             <field var='ip_version'><value>ipv4</value><value>ipv6</value></field>\
             </x>"
            .parse()
            .unwrap();
        let form = DataForm::try_from(elem).unwrap();
        assert_eq!(form.type_, DataFormType::Result_);
        assert_eq!(
            form.form_type.as_deref(),
            Some("urn:xmpp:dataforms:softwareinfo")
        );
        assert_eq!(form.fields.len(), 2);
        assert_eq!(form.fields[1].values, vec!["ipv4", "ipv6"]);
    }

    #[test]
    fn test_serialize() {
        let form = DataForm::result("urn:example", vec![Field::new("os", "Linux")]);
        let elem: Element = form.clone().into();
        let reparsed = DataForm::try_from(elem).unwrap();
        assert_eq!(reparsed, form);
    }
}
