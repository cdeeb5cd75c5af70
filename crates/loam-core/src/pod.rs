//! POD (plain-old-data) verification and the caller-asserted `Pod` marker.
//!
//! The allocators accept two kinds of pointer-freedom claims: the
//! recursive verifier here, which walks a type's [`Shape`] and reports the
//! exact offending path, and the [`Pod`] marker trait, which is an
//! `unsafe` caller assertion checked by nobody. A caller who lies about
//! pointer-freedom gets no guarantees from the library.

use std::error::Error;
use std::fmt;

use crate::shape::{Introspect, Shape};

/// Marker for types that are plain old data.
///
/// # Safety
///
/// Implementors assert two things about the type:
/// - it contains no pointers of any kind (references, boxes, slices,
///   strings, function values, raw pointers), directly or transitively;
/// - the all-zero byte pattern is a valid value.
///
/// The POD allocation paths hand out zeroed raw storage and reinterpret it
/// as `Self` on the strength of this contract. [`assert_plain_old_data`]
/// is available to verify a candidate type before implementing this trait.
#[allow(unsafe_code)]
pub unsafe trait Pod: Copy + 'static {}

macro_rules! pod_impls {
    ($($ty:ty),* $(,)?) => {
        $(
            #[allow(unsafe_code)]
            unsafe impl Pod for $ty {}
        )*
    };
}

pod_impls!(
    bool, char, (),
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
);

#[allow(unsafe_code)]
unsafe impl<T: Pod, const N: usize> Pod for [T; N] {}

/// A pointer-bearing sub-structure found while verifying a type.
///
/// The `Display` rendering reproduces the offending path from the outermost
/// type down to the pointer that disqualified it, e.g.
/// `struct Foo field "name": type alloc::string::String contains pointers`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PodViolation {
    /// The type itself holds pointers.
    ContainsPointers {
        /// Display name of the offending type.
        type_name: &'static str,
    },
    /// An array whose element type holds pointers.
    ArrayElement {
        /// The violation found in the element type.
        inner: Box<PodViolation>,
    },
    /// A struct with a pointer-bearing field.
    StructField {
        /// Display name of the struct.
        struct_name: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// The violation found in the field's type.
        inner: Box<PodViolation>,
    },
}

impl fmt::Display for PodViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsPointers { type_name } => {
                write!(f, "type {type_name} contains pointers")
            }
            Self::ArrayElement { inner } => {
                write!(f, "array element {inner}")
            }
            Self::StructField {
                struct_name,
                field,
                inner,
            } => {
                write!(f, "struct {struct_name} field \"{field}\": {inner}")
            }
        }
    }
}

impl Error for PodViolation {}

/// Walk `T`'s full structure and report the first pointer-bearing
/// sub-structure, if any.
///
/// Unlike the routing check ([`Shape::routes_as_pod`]), this recurses into
/// struct fields, so a pointer-free struct passes. Recursion needs no cycle
/// guard: a cyclic value type without pointers would have infinite size and
/// cannot exist.
pub fn check_plain_old_data<T: Introspect>() -> Result<(), PodViolation> {
    check_shape(&T::shape())
}

/// Assert that `T` is plain old data, panicking with a path-qualified
/// diagnostic if it is not.
pub fn assert_plain_old_data<T: Introspect>() {
    if let Err(violation) = check_plain_old_data::<T>() {
        panic!("{violation}");
    }
}

fn check_shape(shape: &Shape) -> Result<(), PodViolation> {
    match *shape {
        Shape::Primitive { .. } => Ok(()),
        Shape::Array { ref elem, .. } => {
            check_shape(elem).map_err(|inner| PodViolation::ArrayElement {
                inner: Box::new(inner),
            })
        }
        Shape::Struct { name, ref fields } => {
            for &(field, ref field_shape) in fields {
                check_shape(field_shape).map_err(|inner| PodViolation::StructField {
                    struct_name: name,
                    field,
                    inner: Box::new(inner),
                })?;
            }
            Ok(())
        }
        Shape::Pointer { name } => Err(PodViolation::ContainsPointers { type_name: name }),
    }
}
