//! Flutter bridge surface for DriveLog core.

pub mod api;
