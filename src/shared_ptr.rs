//! About shared pointers. Re-export the [`archery`] crate.
//!
//! Trie nodes are shared between map versions through these pointers, so the
//! pointer kind decides whether a [`GenericHamtMap`] can cross threads.
//!
//! [`archery`]: https://docs.rs/archery/latest/
//! [`GenericHamtMap`]: ../hamtmap/struct.GenericHamtMap.html

pub use archery::{ArcK, RcK, SharedPointer, SharedPointerKind};

#[cfg(feature = "triomphe")]
pub use archery::ArcTK;

#[cfg(not(feature = "triomphe"))]
/// Default shared pointer used by [`HamtMap`]. This alias points to [`ArcK`] if `triomphe` is disabled, [`ArcTK`] otherwise.
///
/// [`HamtMap`]: ../hamtmap/type.HamtMap.html
/// [`ArcK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcK.html
/// [`ArcTK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcTK.html
pub type DefaultSharedPtr = ArcK;

#[cfg(feature = "triomphe")]
/// Default shared pointer used by [`HamtMap`]. This alias points to [`ArcK`] if `triomphe` is disabled, [`ArcTK`] otherwise.
///
/// [`HamtMap`]: ../hamtmap/type.HamtMap.html
/// [`ArcK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcK.html
/// [`ArcTK`]: https://docs.rs/archery/latest/archery/shared_pointer/kind/struct.ArcTK.html
pub type DefaultSharedPtr = ArcTK;
