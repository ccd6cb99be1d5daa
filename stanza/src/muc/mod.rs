// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

mod admin;
#[allow(clippy::module_inception)]
mod muc;
mod user;

pub use self::admin::{AdminItem, MucAdminQuery};
pub use self::muc::{History, Muc};
pub use self::user::{Actor, Affiliation, Destroy, Invite, Item, MucUser, Role, Status};
