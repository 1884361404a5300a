use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::index_vec::Idx;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl Idx for $name {
            fn index(self) -> usize {
                self.0 as usize
            }

            fn from_usize(idx: usize) -> Self {
                Self(idx as u32)
            }
        }
    };
}

define_id!(FuncId, "fn");
define_id!(BlockId, "bb");
define_id!(InstId, "i");
define_id!(GlobalId, "g");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_print_with_prefix() {
        assert_eq!(format!("{}", BlockId::new(3)), "bb3");
        assert_eq!(format!("{:?}", InstId::new(12)), "i12");
        assert_eq!(FuncId::from_usize(7).raw(), 7);
    }
}
