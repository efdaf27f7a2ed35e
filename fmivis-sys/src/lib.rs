#![doc=include_str!( "../README.md")]
//! ## Feature flags
#![doc = document_features::document_features!()]
#![deny(clippy::all)]

/// Declares a struct holding a loaded library and one function pointer per symbol, with a
/// same-named `unsafe` method forwarding to each pointer.
///
/// Every symbol is required: construction fails on the first one that cannot be resolved.
macro_rules! dynamic_binding {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( fn $func:ident ( $( $arg:ident : $ty:ty ),* $(,)? ) $( -> $ret:ty )? ; )*
        }
    ) => {
        $(#[$meta])*
        pub struct $name {
            _library: ::libloading::Library,
            $( $func: unsafe extern "C" fn( $( $ty ),* ) $( -> $ret )?, )*
        }

        impl $name {
            /// Load the shared library at `path`, resolving each symbol as `{prefix}{name}`.
            ///
            /// # Safety
            /// Loading a library runs its initialization routines, and the resolved symbols are
            /// trusted to have the declared signatures.
            pub unsafe fn with_prefix<P: AsRef<::std::ffi::OsStr>>(
                path: P,
                prefix: &str,
            ) -> Result<Self, ::libloading::Error> {
                let library = ::libloading::Library::new(path)?;
                $(
                    let $func = *library.get::<unsafe extern "C" fn( $( $ty ),* ) $( -> $ret )?>(
                        format!("{prefix}{}", stringify!($func)).as_bytes(),
                    )?;
                )*
                Ok(Self { _library: library, $( $func, )* })
            }

            $(
                #[inline]
                #[allow(clippy::missing_safety_doc)]
                pub unsafe fn $func(&self, $( $arg: $ty ),* ) $( -> $ret )? {
                    (self.$func)( $( $arg ),* )
                }
            )*
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }
    };
}

#[cfg(feature = "fmi1")]
pub mod fmi1;
#[cfg(feature = "fmi2")]
pub mod fmi2;
