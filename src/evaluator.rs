use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{Expr, Selector, VariablePath},
    config::{IndexPolicy, ResolveOptions},
    lexer::normalize_identifier,
    object::{
        Args, CallError, Key, Kind, Map, Object, Reflect, ReflectMut, Returned, Scalar,
        Sequence, Signature, pointee_mut,
    },
    value::Value,
};

/// Why a path could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionErrorKind {
    #[error("Can't access field '{field}' on type {type_name}")]
    UnknownField {
        field: String,
        type_name: &'static str,
    },

    #[error("Can't access {access} on type {kind}")]
    UnsupportedAccess { access: &'static str, kind: Kind },

    #[error("Index out of range: {index} (length {len})")]
    IndexOutOfRange { index: i128, len: usize },

    #[error("Key '{key}' can't be used with map {type_name}")]
    InvalidKey { key: Key, type_name: &'static str },

    #[error("Index expression must be an integer, string or boolean (got {found})")]
    InvalidSelector { found: String },

    #[error("'{name}' is not a function of type {type_name}")]
    NotCallable {
        name: String,
        type_name: &'static str,
    },

    #[error(
        "Function input argument count ({expected}) of '{name}' must be equal to the calling argument count ({found})"
    )]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("'{name}' must have exactly 1 output argument (has {results})")]
    Results { name: String, results: usize },

    #[error("Function input argument {index} of '{name}' must be of type {expected} (not {found})")]
    ArgumentType {
        name: String,
        index: usize,
        expected: String,
        found: &'static str,
    },

    #[error("Calling '{name}' with a nil argument {index}")]
    NilArgument { name: String, index: usize },

    #[error("Call to '{name}' failed: {source}")]
    Call {
        name: String,
        #[source]
        source: CallError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A resolution failure, positioned at the path part that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[Error | Line {line} Col {column} near '{near}'] {kind} (variable {path})")]
pub struct ResolutionError {
    pub line: usize,
    pub column: usize,
    pub near: String,
    /// Path resolved so far, including the failing part
    pub path: String,
    #[source]
    pub kind: ResolutionErrorKind,
}

/// One resolved path part: its selector and evaluated call arguments.
struct Step {
    key: Key,
    args: Option<Vec<Box<dyn Object>>>,
}

/// Where the walk currently is, or what the last part resolved to.
enum Next<'b> {
    Borrowed(&'b mut dyn Object),
    Owned(Box<dyn Object>),
    Entry(&'b mut dyn Map, Key),
    Pending(&'b mut dyn Sequence, usize),
    Nil,
}

impl Next<'_> {
    /// Copies the result out of a temporary so it outlives it.
    ///
    /// Locations inside a temporary are not writable, so deferred setters
    /// collapse to the value they would read.
    fn detach<'c>(self) -> Next<'c> {
        match self {
            Next::Borrowed(obj) => Next::Owned(obj.clone_object()),
            Next::Owned(obj) => Next::Owned(obj),
            Next::Entry(map, key) => match map.get(&key) {
                Some(obj) => Next::Owned(obj.clone_object()),
                None => Next::Nil,
            },
            Next::Pending(..) | Next::Nil => Next::Nil,
        }
    }
}

/// Resolves parsed expressions against a root object.
///
/// The evaluator holds no per-evaluation state, so one instance can be shared
/// freely; every call works on the root it is given.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: ResolveOptions,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ResolveOptions) -> Self {
        Evaluator { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Evaluates an expression against `root`.
    ///
    /// Literals evaluate to computed values. A variable path is walked part by
    /// part from `root`; the returned [`Value`] borrows `root` when it refers to
    /// a location that can be written.
    ///
    /// # Arguments
    ///
    /// * `expr` - The parsed expression
    /// * `root` - The object the path starts from
    ///
    /// # Examples
    ///
    /// ```
    /// use objpath::{Evaluator, impl_struct, lexer::lex, parser::parse};
    ///
    /// #[derive(Debug, Clone)]
    /// struct Root {
    ///     list: Vec<i64>,
    /// }
    /// impl_struct!(Root { "List" => list });
    ///
    /// let mut root = Root { list: vec![3, 4, 5] };
    /// let expr = parse(lex("list.1").unwrap()).unwrap();
    /// let value = Evaluator::new().evaluate(&expr, &mut root).unwrap();
    /// assert_eq!(value.as_integer(), 4);
    /// ```
    pub fn evaluate<'a>(
        &self,
        expr: &Expr,
        root: &'a mut dyn Object,
    ) -> Result<Value<'a>, ResolutionError> {
        match expr {
            Expr::Integer { value, .. } => Ok(Value::new(*value).at(expr.to_string())),
            Expr::String { value, .. } => Ok(Value::new(value.clone()).at(expr.to_string())),
            Expr::Boolean { value, .. } => Ok(Value::new(*value).at(expr.to_string())),
            Expr::Variable(path) => self.resolve(path, root),
        }
    }

    fn resolve<'a>(
        &self,
        path: &VariablePath,
        root: &'a mut dyn Object,
    ) -> Result<Value<'a>, ResolutionError> {
        // Bracket selectors and call arguments are independent expressions over
        // the same root; evaluate them before the mutable walk borrows it.
        let mut steps = Vec::with_capacity(path.parts.len());
        for (at, part) in path.parts.iter().enumerate() {
            let key = match &part.selector {
                Selector::Field(name) => Key::Text(name.clone()),
                Selector::Index(n) => Key::Int(*n as i128),
                Selector::Computed(expr) => {
                    let selector = self.evaluate(expr, &mut *root)?;
                    selector_key(&selector).map_err(|kind| fail(path, at, kind))?
                }
            };
            let args = match &part.args {
                Some(exprs) => {
                    let mut args = Vec::with_capacity(exprs.len());
                    for (index, expr) in exprs.iter().enumerate() {
                        let arg = self.evaluate(expr, &mut *root)?;
                        let arg = arg.to_owned_object().ok_or_else(|| {
                            fail(
                                path,
                                at,
                                ResolutionErrorKind::NilArgument {
                                    name: key.to_string(),
                                    index,
                                },
                            )
                        })?;
                        args.push(arg);
                    }
                    Some(args)
                }
                None => None,
            };
            steps.push(Step { key, args });
        }

        let total = steps.len();
        let mut current = Next::Borrowed(root);
        for (at, step) in steps.into_iter().enumerate() {
            let last = at + 1 == total;
            let next = match current {
                Next::Borrowed(obj) => self.step(obj, step, last, path, at)?,
                Next::Owned(mut obj) => self.step(obj.as_mut(), step, last, path, at)?.detach(),
                _ => {
                    return Err(fail(
                        path,
                        at,
                        ResolutionErrorKind::Internal("walk continued past a terminal part".into()),
                    ));
                }
            };
            trace!(part = %path.prefix(at + 1), "resolved path part");

            current = match next {
                Next::Nil => return Ok(Value::nil().at(path.to_string())),
                Next::Entry(map, key) => return Ok(Value::entry(map, key).at(path.to_string())),
                Next::Pending(seq, index) => {
                    return Ok(Value::pending(seq, index).at(path.to_string()));
                }
                next => next,
            };
        }

        let value = match current {
            Next::Borrowed(obj) => Value::borrowed(obj),
            Next::Owned(obj) => Value::from_boxed(obj),
            _ => Value::nil(),
        };
        Ok(value.at(path.to_string()))
    }

    /// Resolves one part against `obj`.
    ///
    /// Methods take priority and are looked up before pointers are followed.
    fn step<'b>(
        &self,
        obj: &'b mut dyn Object,
        step: Step,
        last: bool,
        path: &VariablePath,
        at: usize,
    ) -> Result<Next<'b>, ResolutionError> {
        if let Key::Text(name) = &step.key
            && let Some(signature) = obj.method(name)
        {
            let args = step.args.unwrap_or_default();
            return self.invoke(obj, name, &signature, args, path, at);
        }
        if step.args.is_some() {
            return Err(fail(
                path,
                at,
                ResolutionErrorKind::NotCallable {
                    name: step.key.to_string(),
                    type_name: obj.type_name(),
                },
            ));
        }

        let Some(obj) = pointee_mut(obj) else {
            return Ok(Next::Nil);
        };
        let kind = obj.kind();
        let type_name = obj.type_name();

        if let Reflect::Scalar(Scalar::Str(text)) = obj.reflect() {
            return match step.key {
                Key::Int(index) => {
                    let found = usize::try_from(index)
                        .ok()
                        .and_then(|i| text.chars().nth(i));
                    match found {
                        Some(ch) => Ok(Next::Owned(Box::new(ch.to_string()))),
                        None => Err(fail(
                            path,
                            at,
                            ResolutionErrorKind::IndexOutOfRange {
                                index,
                                len: text.chars().count(),
                            },
                        )),
                    }
                }
                _ => Err(fail(
                    path,
                    at,
                    ResolutionErrorKind::UnsupportedAccess {
                        access: "field",
                        kind,
                    },
                )),
            };
        }

        match obj.reflect_mut() {
            ReflectMut::Struct(fields) => match step.key {
                Key::Text(name) => match fields.field_mut(&normalize_identifier(&name)) {
                    Some(field) => Ok(Next::Borrowed(field)),
                    None => Err(fail(
                        path,
                        at,
                        ResolutionErrorKind::UnknownField {
                            field: name,
                            type_name,
                        },
                    )),
                },
                _ => Err(fail(
                    path,
                    at,
                    ResolutionErrorKind::UnsupportedAccess {
                        access: "index",
                        kind,
                    },
                )),
            },
            ReflectMut::Map(map) => {
                let Some(key) = map.coerce_key(&step.key) else {
                    return Err(fail(
                        path,
                        at,
                        ResolutionErrorKind::InvalidKey {
                            key: step.key,
                            type_name,
                        },
                    ));
                };
                if last {
                    return Ok(Next::Entry(map, key));
                }
                Ok(map.get_mut(&key).map(Next::Borrowed).unwrap_or(Next::Nil))
            }
            ReflectMut::Sequence(seq) => {
                let Key::Int(index) = step.key else {
                    return Err(fail(
                        path,
                        at,
                        ResolutionErrorKind::UnsupportedAccess {
                            access: "field",
                            kind,
                        },
                    ));
                };
                let len = seq.len();
                match usize::try_from(index) {
                    Ok(i) if i < len => match seq.get_mut(i) {
                        Some(item) => Ok(Next::Borrowed(item)),
                        None => Err(fail(
                            path,
                            at,
                            ResolutionErrorKind::Internal(format!(
                                "{} reports length {} but has no element {}",
                                type_name, len, i
                            )),
                        )),
                    },
                    Ok(i)
                        if self.options.index_policy == IndexPolicy::Extend
                            && last
                            && i - len < self.options.max_extend =>
                    {
                        Ok(Next::Pending(seq, i))
                    }
                    Ok(_) if self.options.index_policy == IndexPolicy::Extend && !last => {
                        Ok(Next::Nil)
                    }
                    _ => Err(fail(
                        path,
                        at,
                        ResolutionErrorKind::IndexOutOfRange { index, len },
                    )),
                }
            }
            ReflectMut::Leaf if kind == Kind::Nil => Ok(Next::Nil),
            ReflectMut::Leaf => Err(fail(
                path,
                at,
                ResolutionErrorKind::UnsupportedAccess {
                    access: match step.key {
                        Key::Text(_) => "field",
                        _ => "index",
                    },
                    kind,
                },
            )),
            ReflectMut::Pointer(_) => Err(fail(
                path,
                at,
                ResolutionErrorKind::Internal(format!(
                    "{} is still a pointer after dereferencing",
                    type_name
                )),
            )),
        }
    }

    fn invoke<'b>(
        &self,
        obj: &'b mut dyn Object,
        name: &str,
        signature: &Signature,
        args: Vec<Box<dyn Object>>,
        path: &VariablePath,
        at: usize,
    ) -> Result<Next<'b>, ResolutionError> {
        if !signature.accepts_count(args.len()) {
            return Err(fail(
                path,
                at,
                ResolutionErrorKind::Arity {
                    name: name.to_string(),
                    expected: signature.params.len(),
                    found: args.len(),
                },
            ));
        }
        if signature.results != 1 {
            return Err(fail(
                path,
                at,
                ResolutionErrorKind::Results {
                    name: name.to_string(),
                    results: signature.results,
                },
            ));
        }
        for (index, arg) in args.iter().enumerate() {
            let arg = arg.as_ref();
            let accepted = signature.param(index).is_some_and(|p| p.accepts(arg));
            if !accepted {
                return Err(fail(
                    path,
                    at,
                    ResolutionErrorKind::ArgumentType {
                        name: name.to_string(),
                        index,
                        expected: signature
                            .param(index)
                            .map(|p| p.describe())
                            .unwrap_or_else(|| "nothing".to_string()),
                        found: arg.type_name(),
                    },
                ));
            }
        }

        let returned = obj.call(name, Args::new(args)).map_err(|source| {
            fail(
                path,
                at,
                ResolutionErrorKind::Call {
                    name: name.to_string(),
                    source,
                },
            )
        })?;
        Ok(match returned {
            Returned::Borrowed(obj) => Next::Borrowed(obj),
            Returned::Owned(obj) => Next::Owned(obj),
            Returned::Nil => Next::Nil,
        })
    }
}

/// Converts the value of a bracket expression into a selector key.
fn selector_key(value: &Value<'_>) -> Result<Key, ResolutionErrorKind> {
    let resolved = value
        .object()
        .and_then(crate::object::pointee)
        .map(|obj| obj.reflect());
    match resolved {
        Some(Reflect::Scalar(Scalar::Int(n))) => Ok(Key::Int(n as i128)),
        Some(Reflect::Scalar(Scalar::Uint(n))) => Ok(Key::Int(n as i128)),
        Some(Reflect::Scalar(Scalar::Str(s))) => Ok(Key::Text(s.to_string())),
        Some(Reflect::Scalar(Scalar::Bool(b))) => Ok(Key::Bool(b)),
        _ => Err(ResolutionErrorKind::InvalidSelector {
            found: if value.is_nil() {
                "nil".to_string()
            } else {
                value.type_name().to_string()
            },
        }),
    }
}

fn fail(path: &VariablePath, at: usize, kind: ResolutionErrorKind) -> ResolutionError {
    let token = path.parts.get(at).map(|p| &p.token).unwrap_or(&path.token);
    ResolutionError {
        line: token.line,
        column: token.column,
        near: token.text.clone(),
        path: path.prefix(at + 1),
        kind,
    }
}
