/// Return `Input` from the enclosing call when an out pointer is null
macro_rules! check_useful_c_ptr {
    ($e:expr) => {
        if ($e).is_null() {
            return Err($crate::error::Error::input(concat!(
                "invalid pointer for result value: ",
                stringify!($e)
            )));
        }
    };
}

/// Write `$value` through an out pointer already checked with `check_useful_c_ptr!`
macro_rules! write_out {
    ($ptr:expr, $value:expr) => {
        // SAFETY: checked non-null and supplied by the caller for writing
        unsafe { *$ptr = $value }
    };
}
