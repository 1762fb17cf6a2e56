/// Unwraps an `Err`, panicking with the `Ok` value otherwise.
///
/// `assert_err!(expr => is_kind)` also checks the error with the named
/// predicate method.
#[macro_export]
macro_rules! assert_err {
    ($e:expr => $kind:ident) => {{
        let err = $crate::assert_err!($e);
        assert!(
            err.$kind(),
            "expected `{}` error; actual={}",
            stringify!($kind),
            err
        );
        err
    }};
    ($e:expr) => {
        match $e {
            Err(err) => err,
            Ok(actual) => panic!("expected `Err`; actual=Ok({:?})", actual),
        }
    };
}

#[macro_export]
macro_rules! assert_ok {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(err) => panic!("expected `Ok`; actual=Err({})", err),
        }
    };
}
