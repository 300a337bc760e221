mod point;
pub use self::point::*;
