//! Convenience macros for configuration authoring

/// Build an [`Args`](crate::Args) map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works.
///
/// # Examples
///
/// ```ignore
/// // Empty
/// let none = args! {};
///
/// // Several keys, nested values through json!
/// let ship = args! {
///     "speed" => 4.5,
///     "name" => "scout",
///     "pos" => json!({ "x": 10, "y": 20 }),
/// };
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::Args::new();
        $(
            args.insert($key, $crate::serde_json::json!($value));
        )+
        args
    }};
}
