/// Creates a [`ToolInvocation`](crate::ToolInvocation) from a tool name and
/// JSON-literal arguments. A bare identifier is taken as the tool name
/// itself; pass a string expression to name a tool from a variable.
///
/// ```rust
/// use serde_json::json;
/// use toolwire::tw_invocation;
///
/// let invocation = tw_invocation!(add, { "a": 5, "b": 7 });
/// assert_eq!(invocation.tool_name, "add");
/// assert_eq!(invocation.arguments["b"], json!(7));
///
/// let bare = tw_invocation!("evaluate_expression");
/// assert!(bare.arguments.is_empty());
/// ```
#[macro_export]
macro_rules! tw_invocation {
    ($name:ident $(,)?) => {
        $crate::tw_invocation!(stringify!($name))
    };
    ($name:ident, $($arguments:tt)+) => {
        $crate::tw_invocation!(stringify!($name), $($arguments)+)
    };
    ($name:expr $(,)?) => {
        $crate::ToolInvocation::from_json($name, $crate::serde_json::json!({}))
    };
    ($name:expr, $($arguments:tt)+) => {
        $crate::ToolInvocation::from_json($name, $crate::serde_json::json!($($arguments)+))
    };
}

/// Creates a [`ServerCommand`](crate::ServerCommand) from a program and its
/// arguments.
///
/// ```rust
/// use toolwire::tw_command;
///
/// let command = tw_command!("toolwire-server", "--listen", "127.0.0.1:7000");
/// assert_eq!(command.command, "toolwire-server");
/// assert_eq!(command.args, vec!["--listen", "127.0.0.1:7000"]);
/// ```
#[macro_export]
macro_rules! tw_command {
    ($program:expr $(, $arg:expr)* $(,)?) => {
        $crate::ServerCommand::new($program)$(.arg($arg))*
    };
}
