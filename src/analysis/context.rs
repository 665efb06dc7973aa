//! Context classification
//!
//! Assigns exactly one [`ContextLabel`] to every declaration. Checks run in
//! a fixed priority order and the first match wins; anything unrecognised
//! falls through to `RegularFunction`.

use super::framework_patterns::{CliStyle, Framework, FrameworkProfile};
use crate::core::{ContextLabel, Declaration, EnclosingScope};
use crate::naming::casing::{first_word, last_word};

/// Constructors whose result is a framework-owned singleton
const SINGLETON_CONSTRUCTORS: &[&str] = &[
    "FastAPI",
    "APIRouter",
    "Flask",
    "Blueprint",
    "Typer",
    "Celery",
    "Redis",
    "create_app",
    "get_app",
    "declarative_base",
    "sessionmaker",
    "create_engine",
    "express",
    "Router",
    "createApp",
    "createRouter",
    "createStore",
    "PrismaClient",
    "QueryClient",
];

const TYPEVAR_CONSTRUCTORS: &[&str] = &["TypeVar", "ParamSpec", "TypeVarTuple", "NewType"];

/// Logger factories matched on the full callee path
const LOGGER_CALLEES: &[&str] = &["logging.getLogger", "structlog.get_logger"];

/// Logger factories matched on the last path segment
const LOGGER_FACTORIES: &[&str] = &["getLogger", "get_logger", "Logger", "createLogger", "pino"];

/// Decorator methods that register a function as an HTTP/event handler
const HANDLER_DECORATOR_METHODS: &[&str] = &[
    "get",
    "post",
    "put",
    "patch",
    "delete",
    "head",
    "options",
    "trace",
    "route",
    "api_route",
    "websocket",
    "websocket_route",
    "exception_handler",
    "errorhandler",
    "middleware",
    "on_event",
    "before_request",
    "after_request",
    "teardown_request",
    "context_processor",
    "task",
];

/// Decorators (path without `@` and arguments) that hand the function to a
/// framework: fixtures, validators, properties, signal receivers, DI members
const HANDLER_DECORATORS: &[&str] = &[
    "pytest.fixture",
    "fixture",
    "validator",
    "field_validator",
    "model_validator",
    "root_validator",
    "computed_field",
    "property",
    "cached_property",
    "functools.cached_property",
    "receiver",
    "login_required",
    "require_http_methods",
    "require_GET",
    "require_POST",
    "csrf_exempt",
    "permission_required",
    "api_view",
    "action",
    "shared_task",
    "HostListener",
    "Input",
    "Output",
    "ViewChild",
    "Get",
    "Post",
    "Put",
    "Patch",
    "Delete",
    "Effect",
    "OnEvent",
    "Cron",
    "MessagePattern",
    "EventPattern",
    "Subscribe",
];

/// Property accessor suffixes: `@name.setter`
const PROPERTY_ACCESSORS: &[&str] = &["setter", "getter", "deleter"];

const REACT_LIFECYCLE: &[&str] = &[
    "componentDidMount",
    "componentDidUpdate",
    "componentWillUnmount",
    "shouldComponentUpdate",
    "getDerivedStateFromProps",
    "getSnapshotBeforeUpdate",
    "componentDidCatch",
    "getDerivedStateFromError",
];

const ANGULAR_LIFECYCLE: &[&str] = &[
    "ngOnInit",
    "ngOnChanges",
    "ngDoCheck",
    "ngAfterContentInit",
    "ngAfterContentChecked",
    "ngAfterViewInit",
    "ngAfterViewChecked",
    "ngOnDestroy",
];

const VUE_LIFECYCLE: &[&str] = &[
    "setup",
    "data",
    "beforeCreate",
    "created",
    "beforeMount",
    "mounted",
    "beforeUpdate",
    "updated",
    "beforeUnmount",
    "unmounted",
    "activated",
    "deactivated",
    "errorCaptured",
];

/// Names Next.js looks up by convention in route and page modules
const NEXTJS_EXPORTS: &[&str] = &[
    "GET",
    "POST",
    "PUT",
    "PATCH",
    "DELETE",
    "HEAD",
    "OPTIONS",
    "getServerSideProps",
    "getStaticProps",
    "getStaticPaths",
    "generateMetadata",
    "generateStaticParams",
    "middleware",
];

const COMPONENT_RETURN_TYPES: &[&str] = &["JSX.Element", "ReactElement", "ReactNode", "React.FC"];

/// Classify a declaration in the context of the project's frameworks
pub fn classify(decl: &Declaration, profile: &FrameworkProfile) -> ContextLabel {
    if decl.is_assignment() {
        let callee_name = decl.value_shape().and_then(|s| s.callee_name());
        let callee = decl.value_shape().and_then(|s| s.callee());

        if callee_name.is_some_and(|c| SINGLETON_CONSTRUCTORS.contains(&c)) {
            return ContextLabel::Singleton;
        }
        if callee_name.is_some_and(|c| TYPEVAR_CONSTRUCTORS.contains(&c)) {
            return ContextLabel::TypeVar;
        }
        if callee.is_some_and(|c| LOGGER_CALLEES.contains(&c))
            || callee_name.is_some_and(|c| LOGGER_FACTORIES.contains(&c))
        {
            return ContextLabel::LoggerInstance;
        }
        if is_constant_name(&decl.name) && decl.value_shape().is_some_and(|s| s.is_literal()) {
            return ContextLabel::Constant;
        }
        return ContextLabel::RegularFunction;
    }

    if has_test_prefix(decl) {
        return ContextLabel::TestFunction;
    }
    if is_cli_command(decl) && profile.idioms.cli_style == CliStyle::Rails {
        return ContextLabel::CliCommand;
    }
    if profile.idioms.uses_response_factories && is_factory_name(&decl.name) {
        return ContextLabel::ResponseFactory;
    }
    if is_framework_handler(decl, profile) {
        return ContextLabel::FrameworkHandler;
    }
    ContextLabel::RegularFunction
}

/// Has letters and none of them lowercase: `MAX_RETRIES`, `API_V2`
fn is_constant_name(name: &str) -> bool {
    name.chars().any(char::is_uppercase) && !name.chars().any(char::is_lowercase)
}

/// `test`, `test_foo` or `testFoo` in every language; `testimony` is a word
fn has_test_prefix(decl: &Declaration) -> bool {
    match decl.name.strip_prefix("test") {
        Some(rest) => rest
            .chars()
            .next()
            .is_none_or(|c| c == '_' || c.is_uppercase()),
        None => false,
    }
}

/// Decorator path without `@` and call arguments: `@app.get("/x")` -> `app.get`
fn decorator_path(decorator: &str) -> &str {
    let path = decorator.trim().trim_start_matches('@');
    path.split('(').next().unwrap_or(path).trim()
}

fn is_cli_command(decl: &Declaration) -> bool {
    if decl.scope == EnclosingScope::CliGroup {
        return true;
    }
    decl.decorators.iter().any(|d| {
        let path = decorator_path(d);
        matches!(path, "command" | "group")
            || path.ends_with(".command")
            || path.ends_with(".group")
    })
}

fn is_factory_name(name: &str) -> bool {
    first_word(name).as_deref() == Some("create") || last_word(name).as_deref() == Some("response")
}

fn is_framework_handler(decl: &Declaration, profile: &FrameworkProfile) -> bool {
    decl.is_accessor
        || has_handler_decorator(decl)
        || is_django_view(decl, profile)
        || is_react_component(decl, profile)
        || is_lifecycle_hook(decl, profile)
        || (profile.is_active(Framework::NextJS) && NEXTJS_EXPORTS.contains(&decl.name.as_str()))
}

fn has_handler_decorator(decl: &Declaration) -> bool {
    decl.decorators.iter().any(|d| {
        let path = decorator_path(d);
        if HANDLER_DECORATORS.contains(&path) {
            return true;
        }
        match path.rsplit_once('.') {
            Some((_, method)) => {
                HANDLER_DECORATOR_METHODS.contains(&method)
                    || PROPERTY_ACCESSORS.contains(&method)
                    || HANDLER_DECORATORS.contains(&method)
            }
            None => false,
        }
    })
}

/// Django view functions and class-based view methods take `request` first
fn is_django_view(decl: &Declaration, profile: &FrameworkProfile) -> bool {
    profile.is_active(Framework::Django)
        && decl.language.is_python()
        && decl.explicit_parameters().next() == Some("request")
}

fn is_react_component(decl: &Declaration, profile: &FrameworkProfile) -> bool {
    if !decl.language.is_ecmascript() {
        return false;
    }
    let react_project = profile.any_active(&[Framework::React, Framework::NextJS])
        || profile.idioms.component_functions;
    let pascal = decl.name.chars().next().is_some_and(char::is_uppercase);
    let returns_component = decl.contains_jsx
        || decl
            .return_type
            .as_deref()
            .is_some_and(|t| COMPONENT_RETURN_TYPES.iter().any(|c| t.contains(c)));
    react_project && pascal && returns_component
}

fn is_lifecycle_hook(decl: &Declaration, profile: &FrameworkProfile) -> bool {
    if !decl.language.is_ecmascript() || decl.scope != EnclosingScope::Class {
        return false;
    }
    let name = decl.name.as_str();
    (profile.is_active(Framework::React) && REACT_LIFECYCLE.contains(&name))
        || (profile.is_active(Framework::Angular) && ANGULAR_LIFECYCLE.contains(&name))
        || (profile.is_active(Framework::Vue) && VUE_LIFECYCLE.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::framework_patterns::IdiomFlags;
    use crate::core::{AssignedValue, Language, SourceLocation, ValueShape};

    fn py_func(name: &str) -> Declaration {
        Declaration::function(name, Language::Python, SourceLocation::new("a.py", 1))
    }

    fn js_func(name: &str) -> Declaration {
        Declaration::function(name, Language::TypeScript, SourceLocation::new("a.tsx", 1))
    }

    fn assign(name: &str, text: &str, shape: ValueShape) -> Declaration {
        Declaration::assignment(
            name,
            Language::Python,
            SourceLocation::new("a.py", 1),
            AssignedValue {
                text: text.to_string(),
                shape,
            },
        )
    }

    fn call(callee: &str) -> ValueShape {
        ValueShape::Call {
            callee: callee.to_string(),
        }
    }

    fn rails_factories() -> FrameworkProfile {
        let mut profile = FrameworkProfile::with_frameworks([Framework::Typer, Framework::FastAPI]);
        profile.idioms = IdiomFlags {
            cli_style: CliStyle::Rails,
            uses_response_factories: true,
            ..profile.idioms
        };
        profile
    }

    #[test]
    fn test_assignment_labels() {
        let empty = FrameworkProfile::empty();
        assert_eq!(
            classify(&assign("app", "FastAPI()", call("FastAPI")), &empty),
            ContextLabel::Singleton
        );
        assert_eq!(
            classify(&assign("cli", "typer.Typer()", call("typer.Typer")), &empty),
            ContextLabel::Singleton
        );
        assert_eq!(
            classify(&assign("T", "TypeVar('T')", call("TypeVar")), &empty),
            ContextLabel::TypeVar
        );
        assert_eq!(
            classify(
                &assign("logger", "logging.getLogger(__name__)", call("logging.getLogger")),
                &empty
            ),
            ContextLabel::LoggerInstance
        );
        assert_eq!(
            classify(&assign("MAX_RETRIES", "3", ValueShape::Literal), &empty),
            ContextLabel::Constant
        );
        assert_eq!(
            classify(&assign("DEFAULT_USER", "User()", call("User")), &empty),
            ContextLabel::RegularFunction
        );
        assert_eq!(
            classify(&assign("timeout", "30", ValueShape::Literal), &empty),
            ContextLabel::RegularFunction
        );
    }

    #[test]
    fn test_test_prefix_without_frameworks() {
        let empty = FrameworkProfile::empty();
        assert_eq!(classify(&py_func("test_login"), &empty), ContextLabel::TestFunction);
        assert_eq!(classify(&js_func("testLogin"), &empty), ContextLabel::TestFunction);
        assert_eq!(classify(&js_func("testimony"), &empty), ContextLabel::RegularFunction);
        assert_eq!(
            classify(&py_func("testimony_parser"), &empty),
            ContextLabel::RegularFunction
        );
        assert_eq!(classify(&py_func("test"), &empty), ContextLabel::TestFunction);
    }

    #[test]
    fn test_cli_command_needs_rails_style() {
        let decl = py_func("start").with_decorators(["@cli.command()"]);
        assert_eq!(classify(&decl, &rails_factories()), ContextLabel::CliCommand);
        assert_eq!(
            classify(&decl, &FrameworkProfile::empty()),
            ContextLabel::RegularFunction
        );
    }

    #[test]
    fn test_cli_beats_factory() {
        let decl = py_func("create_report").with_decorators(["@app.command()"]);
        assert_eq!(classify(&decl, &rails_factories()), ContextLabel::CliCommand);
        assert_eq!(
            classify(&py_func("create_report"), &rails_factories()),
            ContextLabel::ResponseFactory
        );
        assert_eq!(
            classify(&py_func("error_response"), &rails_factories()),
            ContextLabel::ResponseFactory
        );
    }

    #[test]
    fn test_framework_handlers() {
        let empty = FrameworkProfile::empty();
        let route = py_func("users").with_decorators(["@router.get(\"/users\")"]);
        assert_eq!(classify(&route, &empty), ContextLabel::FrameworkHandler);

        let fixture = py_func("client").with_decorators(["@pytest.fixture"]);
        assert_eq!(classify(&fixture, &empty), ContextLabel::FrameworkHandler);

        let setter = py_func("name").with_decorators(["@name.setter"]);
        assert_eq!(classify(&setter, &empty), ContextLabel::FrameworkHandler);

        let accessor = js_func("fullName")
            .with_scope(EnclosingScope::Class)
            .with_accessor(true);
        assert_eq!(classify(&accessor, &empty), ContextLabel::FrameworkHandler);

        let unknown = py_func("process").with_decorators(["@my_decorator"]);
        assert_eq!(classify(&unknown, &empty), ContextLabel::RegularFunction);
    }

    #[test]
    fn test_django_view_signature() {
        let django = FrameworkProfile::with_frameworks([Framework::Django]);
        let view = py_func("index").with_parameters(["request"]);
        assert_eq!(classify(&view, &django), ContextLabel::FrameworkHandler);

        let method = py_func("dashboard").with_parameters(["self", "request", "pk"]);
        assert_eq!(classify(&method, &django), ContextLabel::FrameworkHandler);
        assert_eq!(
            classify(&view, &FrameworkProfile::empty()),
            ContextLabel::RegularFunction
        );
    }

    #[test]
    fn test_react_component_and_lifecycle() {
        let react = FrameworkProfile::with_frameworks([Framework::React]);
        let component = js_func("UserCard").with_jsx(true);
        assert_eq!(classify(&component, &react), ContextLabel::FrameworkHandler);
        assert_eq!(
            classify(&component, &FrameworkProfile::empty()),
            ContextLabel::RegularFunction
        );

        let hook = js_func("componentDidMount").with_scope(EnclosingScope::Class);
        assert_eq!(classify(&hook, &react), ContextLabel::FrameworkHandler);

        let angular = FrameworkProfile::with_frameworks([Framework::Angular]);
        let init = js_func("ngOnInit").with_scope(EnclosingScope::Class);
        assert_eq!(classify(&init, &angular), ContextLabel::FrameworkHandler);
    }

    #[test]
    fn test_nextjs_route_handlers() {
        let next = FrameworkProfile::with_frameworks([Framework::NextJS]);
        assert_eq!(classify(&js_func("GET"), &next), ContextLabel::FrameworkHandler);
    }
}
