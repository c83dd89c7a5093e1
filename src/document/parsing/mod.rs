//! Document parsing utilities
//!
//! This module contains specialized parsing functions for the parts of a
//! Word document the importer understands.

pub(crate) mod formatting;
pub(crate) mod heading;
pub(crate) mod table;
