//! Static types of the Cool language
//!
//! A type is either a class name or the polymorphic `SELF_TYPE` marker.
//! Well-known class and identifier names live here as well.

mod cool_type;

pub use cool_type::{names, Type};
