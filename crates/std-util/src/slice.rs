#[macro_export]
macro_rules! assert_empty {
    ($e:expr) => {
        match &$e {
            v if v.is_empty() => {}
            actual => panic!("expected empty; actual={:?}", actual),
        }
    };
}
