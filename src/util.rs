/// Open a profiling span that lasts until the end of the enclosing scope.
///
/// Takes the span name and the name of the function it's in.
/// Expands to a unit value unless the `tracy` feature is enabled,
/// in which case it records a span if a Tracy client is running.
#[macro_export]
macro_rules! tracy_span {
    ($name:literal, $fn_name:literal) => {{
        #[cfg(feature = "tracy")]
        let span = tracy_client::Client::running()
            .map(|client| client.span_alloc(Some($name), $fn_name, file!(), line!(), 0));
        #[cfg(not(feature = "tracy"))]
        let span = ();
        span
    }};
}
