//! Macro for DynArray

/// Array initialization macro.
///
/// ```rust
/// use seq_collections::array;
///
/// let a = array![1; 4].unwrap();
/// assert_eq!(a.as_slice(), &[1, 1, 1, 1]);
///
/// let a = array![1, 2, 3, 4].unwrap();
/// assert_eq!(a.as_slice(), &[1, 2, 3, 4]);
/// ```
#[macro_export]
macro_rules! array {
    (@single $($x:tt)*) => (());
    (@count $($rest:expr),*) => (<[()]>::len(&[$($crate::array!(@single $rest)),*]));

    ($item:expr; $count:expr) => {{
        let init = || -> Result<_, $crate::array::Error> {
            let mut a = $crate::DynArray::with_capacity($count)?;
            a.resize($count, $item)?;
            Ok(a)
        };
        init()
    }};
    ($($x:expr),*) => {{
        let init = || -> Result<_, $crate::array::Error> {
            let cnt = $crate::array!(@count $($x),*);
            let mut a = $crate::DynArray::with_capacity(cnt)?;
            $(
                a.push($x)?;
            )*
            Ok(a)
        };
        init()
    }};
    ($($x:expr,)*) => ($crate::array![$($x),*])
}
