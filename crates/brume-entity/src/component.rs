//! The component boundary: what may be stored, and how it is erased.
//!
//! Any `'static` value is a component; there is no trait to implement and no
//! registration step. [`ErasedSlot`] is the uniform holder an entity keeps
//! per [`TypeKey`](crate::key::TypeKey): a `Box<dyn Any>` payload plus
//! checked downcasts that are correct by construction, because the key a
//! slot is filed under encodes the payload's type.

use std::any::Any;

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// Marker for types that can live on an entity.
///
/// Blanket-implemented for every `'static` type, sized or not; never
/// implement it by hand. The bound exists to name the concept in signatures,
/// not to be opted into.
pub trait Component: 'static {}

impl<T: ?Sized + 'static> Component for T {}

// ---------------------------------------------------------------------------
// ErasedSlot
// ---------------------------------------------------------------------------

/// Type-erased storage for one component instance.
///
/// Two payload shapes exist behind the `dyn Any`:
///
/// - a value stored by its own type holds the value directly;
/// - a value filed under an alias type `A` holds the caller's `Box<A>`, so
///   the concrete type's vtable and destructor travel with it.
///
/// Sized accessors try both shapes. The key a slot is filed under already
/// limits which types can possibly be inside, so a miss here means the
/// caller asked through the wrong access family, never that data is mistyped.
pub(crate) struct ErasedSlot {
    payload: Box<dyn Any>,
}

impl ErasedSlot {
    /// Erase a value stored by its own type.
    pub(crate) fn direct<C: Component>(value: C) -> Self {
        Self {
            payload: Box::new(value),
        }
    }

    /// Erase a boxed value filed under alias type `A`.
    pub(crate) fn aliased<A: ?Sized + Component>(value: Box<A>) -> Self {
        Self {
            payload: Box::new(value),
        }
    }

    /// Borrow as `C`, whichever shape holds it.
    pub(crate) fn get<C: Component>(&self) -> Option<&C> {
        match self.payload.downcast_ref::<C>() {
            Some(value) => Some(value),
            None => self.payload.downcast_ref::<Box<C>>().map(|boxed| &**boxed),
        }
    }

    /// Mutably borrow as `C`, whichever shape holds it.
    pub(crate) fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        if self.payload.is::<C>() {
            self.payload.downcast_mut::<C>()
        } else {
            self.payload
                .downcast_mut::<Box<C>>()
                .map(|boxed| &mut **boxed)
        }
    }

    /// Borrow through the alias shape as `A`.
    pub(crate) fn get_aliased<A: ?Sized + Component>(&self) -> Option<&A> {
        self.payload.downcast_ref::<Box<A>>().map(|boxed| &**boxed)
    }

    /// Mutably borrow through the alias shape as `A`.
    pub(crate) fn get_aliased_mut<A: ?Sized + Component>(&mut self) -> Option<&mut A> {
        self.payload
            .downcast_mut::<Box<A>>()
            .map(|boxed| &mut **boxed)
    }

    /// Whether the payload is the alias shape for `A`.
    pub(crate) fn holds_aliased<A: ?Sized + Component>(&self) -> bool {
        self.payload.is::<Box<A>>()
    }

    /// Take the payload out as an owned `C`, whichever shape holds it.
    ///
    /// On a shape miss the slot comes back untouched in `Err`, so nothing is
    /// ever dropped by asking the wrong question.
    pub(crate) fn into_value<C: Component>(self) -> Result<C, Self> {
        let payload = match self.payload.downcast::<C>() {
            Ok(value) => return Ok(*value),
            Err(payload) => payload,
        };
        match payload.downcast::<Box<C>>() {
            Ok(outer) => {
                let inner = *outer;
                Ok(*inner)
            }
            Err(payload) => Err(Self { payload }),
        }
    }

    /// Take the payload out through the alias shape.
    pub(crate) fn into_aliased<A: ?Sized + Component>(self) -> Result<Box<A>, Self> {
        match self.payload.downcast::<Box<A>>() {
            Ok(outer) => Ok(*outer),
            Err(payload) => Err(Self { payload }),
        }
    }

    /// The payload as `dyn Any`, for snapshot-style iteration.
    pub(crate) fn as_any(&self) -> &dyn Any {
        &*self.payload
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
