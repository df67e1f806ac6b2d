// SPDX-License-Identifier: AGPL-3.0-or-later

//! Named domain queries of the read API, implemented on top of the temporal
//! graph engine. One module per concern.
pub mod auth;
pub mod member;
pub mod role;
pub mod role_event;
pub mod tension;
pub mod timeline;
