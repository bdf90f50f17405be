// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand: s!() → String::new(), s!(x) → String::from(x)
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

/// Owned field-name list: `fields!["Rank", "Country"]`.
#[macro_export]
macro_rules! fields {
    ($($name:expr),* $(,)?) => {
        ::std::vec![$(::std::string::String::from($name)),*]
    };
}
