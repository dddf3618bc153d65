/// Defines a `usize` newtype used to index a `Vec<$t>` or `[$t]` without
/// mixing up indices of different collections.
#[macro_export]
macro_rules! define_index_newtype {
    ($name:ident) => {
        #[derive(
            serde::Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
        )]
        pub struct $name(usize);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $name {
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            pub const fn get(&self) -> usize {
                self.0
            }

            /// Iterates over every index of a collection of length `len`.
            pub fn range(len: usize) -> impl Iterator<Item = $name> {
                (0..len).map($name)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }
    };
    ($name:ident, $t:ident) => {
        $crate::define_index_newtype!($name);

        impl std::ops::Index<$name> for Vec<$t> {
            type Output = $t;
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.0]
            }
        }

        impl std::ops::IndexMut<$name> for Vec<$t> {
            fn index_mut(&mut self, index: $name) -> &mut Self::Output {
                &mut self[index.0]
            }
        }

        impl std::ops::Index<$name> for [$t] {
            type Output = $t;
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.0]
            }
        }

        impl std::ops::IndexMut<$name> for [$t] {
            fn index_mut(&mut self, index: $name) -> &mut Self::Output {
                &mut self[index.0]
            }
        }
    };
}
