//! Structured event logging for proxied driver calls.
//!
//! Every proxied call produces one [`Event`]: a prefixed name, a severity and
//! a list of key/value [`Attr`]s. Events go to the [`EventSink`] configured in
//! [`LogConfig`]; [`TracingSink`] forwards them to `tracing`.

use std::fmt;
use std::ops::Add;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sea_orm::Value;
use tracing::Level;

use crate::config::LogConfig;
use crate::context::Context;
use crate::driver::NamedValue;
use crate::error::{DriverError, Result};

/// Additive event severity.
///
/// Levels are integers so a configured base offset can shift every event up
/// or down: `Severity::INFO + Severity::new(-4)` is `Severity::DEBUG`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Severity(i8);

impl Severity {
    pub const DEBUG: Self = Self(-4);
    pub const INFO: Self = Self(0);
    pub const WARN: Self = Self(4);
    pub const ERROR: Self = Self(8);

    /// Severity at an arbitrary level, usually an offset for `with_base_level`.
    pub const fn new(level: i8) -> Self {
        Self(level)
    }

    /// Raw integer level.
    pub const fn level(self) -> i8 {
        self.0
    }

    /// Closest `tracing` level at or below this severity.
    pub fn to_tracing(self) -> Level {
        if self < Self::DEBUG {
            Level::TRACE
        } else if self < Self::INFO {
            Level::DEBUG
        } else if self < Self::WARN {
            Level::INFO
        } else if self < Self::ERROR {
            Level::WARN
        } else {
            Level::ERROR
        }
    }
}

impl Add for Severity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = if *self < Self::INFO {
            ("DEBUG", Self::DEBUG)
        } else if *self < Self::WARN {
            ("INFO", Self::INFO)
        } else if *self < Self::ERROR {
            ("WARN", Self::WARN)
        } else {
            ("ERROR", Self::ERROR)
        };
        match i16::from(self.0) - i16::from(base.0) {
            0 => f.write_str(name),
            offset => write!(f, "{name}{offset:+}"),
        }
    }
}

/// Value of an event attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    Duration(Duration),
    Args(Vec<Value>),
    Error(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s:?}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Duration(d) => write!(f, "{d:?}"),
            AttrValue::Args(args) => {
                f.write_str("[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg:?}")?;
                }
                f.write_str("]")
            }
            AttrValue::Error(e) => write!(f, "{e:?}"),
        }
    }
}

/// A key/value pair attached to an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: &'static str,
    pub value: AttrValue,
}

impl Attr {
    pub fn string(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: AttrValue::Str(value.into()),
        }
    }

    pub fn bool(key: &'static str, value: bool) -> Self {
        Self {
            key,
            value: AttrValue::Bool(value),
        }
    }

    pub fn duration(key: &'static str, value: Duration) -> Self {
        Self {
            key,
            value: AttrValue::Duration(value),
        }
    }

    pub fn args(key: &'static str, values: Vec<Value>) -> Self {
        Self {
            key,
            value: AttrValue::Args(values),
        }
    }

    pub fn error(key: &'static str, err: &DriverError) -> Self {
        Self {
            key,
            value: AttrValue::Error(err.to_string()),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

pub(crate) fn query_attr(query: &str) -> Attr {
    Attr::string("query", query)
}

pub(crate) fn args_attr(args: &[Value]) -> Attr {
    Attr::args("args", args.to_vec())
}

pub(crate) fn named_args_attr(args: &[NamedValue]) -> Attr {
    Attr::args("args", args.iter().map(|arg| arg.value.clone()).collect())
}

/// One logged driver call.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub severity: Severity,
    pub attrs: Vec<Attr>,
}

impl Event {
    /// First attribute with the given key.
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.key == key).map(|a| &a.value)
    }
}

/// Destination for events. Called concurrently from independent connections.
pub trait EventSink: Send + Sync {
    fn log(&self, ctx: &Context, event: &Event);
}

/// Sink that emits events through the `tracing` crate under the `sqlog` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

struct DisplayAttrs<'a>(Vec<&'a Attr>);

impl fmt::Display for DisplayAttrs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{attr}")?;
        }
        Ok(())
    }
}

/// Attributes with a known key, split out so each becomes its own tracing
/// field. Absent keys stay unset; anything else is rendered into `attrs`.
#[derive(Default)]
struct EventFields<'a> {
    conn_id: Option<&'a str>,
    stmt_id: Option<&'a str>,
    tx_id: Option<&'a str>,
    query: Option<&'a str>,
    args: Option<&'a AttrValue>,
    read_only: Option<bool>,
    duration: Option<Duration>,
    error: Option<&'a str>,
    abandoned: Option<bool>,
    extra: Option<DisplayAttrs<'a>>,
}

impl<'a> EventFields<'a> {
    fn new(attrs: &'a [Attr]) -> Self {
        let mut fields = Self::default();
        let mut extra = Vec::new();
        for attr in attrs {
            match (attr.key, &attr.value) {
                ("connID", AttrValue::Str(v)) => fields.conn_id = Some(v),
                ("stmtID", AttrValue::Str(v)) => fields.stmt_id = Some(v),
                ("txID", AttrValue::Str(v)) => fields.tx_id = Some(v),
                ("query", AttrValue::Str(v)) => fields.query = Some(v),
                ("args", v @ AttrValue::Args(_)) => fields.args = Some(v),
                ("readOnly", AttrValue::Bool(v)) => fields.read_only = Some(*v),
                ("duration", AttrValue::Duration(v)) => fields.duration = Some(*v),
                ("error", AttrValue::Error(v)) => fields.error = Some(v),
                ("abandoned", AttrValue::Bool(v)) => fields.abandoned = Some(*v),
                _ => extra.push(attr),
            }
        }
        if !extra.is_empty() {
            fields.extra = Some(DisplayAttrs(extra));
        }
        fields
    }
}

macro_rules! sink_event {
    ($level:expr, $fields:ident, $name:expr) => {
        tracing::event!(
            target: "sqlog",
            $level,
            connID = $fields.conn_id,
            stmtID = $fields.stmt_id,
            txID = $fields.tx_id,
            query = $fields.query,
            args = $fields.args.map(tracing::field::display),
            readOnly = $fields.read_only,
            duration = $fields.duration.map(tracing::field::debug),
            error = $fields.error,
            abandoned = $fields.abandoned,
            attrs = $fields.extra.as_ref().map(tracing::field::display),
            "{}",
            $name
        )
    };
}

impl EventSink for TracingSink {
    fn log(&self, _ctx: &Context, event: &Event) {
        let fields = EventFields::new(&event.attrs);
        let name = event.name.as_str();
        let level = event.severity.to_tracing();

        if level == Level::ERROR {
            sink_event!(Level::ERROR, fields, name);
        } else if level == Level::WARN {
            sink_event!(Level::WARN, fields, name);
        } else if level == Level::INFO {
            sink_event!(Level::INFO, fields, name);
        } else if level == Level::DEBUG {
            sink_event!(Level::DEBUG, fields, name);
        } else {
            sink_event!(Level::TRACE, fields, name);
        }
    }
}

/// Event category, selecting the name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Conn,
    Stmt,
    Tx,
}

/// Logger scoped with an append-only set of correlation attributes.
#[derive(Clone)]
pub struct EventLogger {
    config: Arc<LogConfig>,
    attrs: Vec<Attr>,
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger")
            .field("config", &self.config)
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl EventLogger {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config: Arc::new(config),
            attrs: Vec::new(),
        }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    /// Child logger carrying this logger's attributes followed by `attrs`.
    pub fn with(&self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        let mut child = self.clone();
        child.attrs.extend(attrs);
        child
    }

    fn category_prefix(&self, category: Category) -> &str {
        match category {
            Category::Conn => "",
            Category::Stmt => &self.config.stmt_prefix,
            Category::Tx => &self.config.tx_prefix,
        }
    }

    /// Emit one event.
    ///
    /// `name` is prefixed with the configured base prefix. A `None` start
    /// time never yields a duration. [`DriverError::Skip`] is dropped unless
    /// the config asks for it to be reported as a warning.
    pub fn log(
        &self,
        ctx: &Context,
        severity: Severity,
        name: &str,
        started: Option<Instant>,
        err: Option<&DriverError>,
        mut attrs: Vec<Attr>,
    ) {
        let Some(sink) = self.config.sink.as_ref() else {
            return;
        };

        if let Some(started) = started.filter(|_| self.config.log_duration) {
            attrs.push(Attr::duration("duration", started.elapsed()));
        }

        let mut severity = self.config.base_level + severity;

        if let Some(err) = err {
            severity = Severity::ERROR;
            if err.is_skip() {
                if !self.config.warn_on_skip {
                    return;
                }
                severity = Severity::WARN;
            }
            attrs.push(Attr::error("error", err));
        }

        let mut all = Vec::with_capacity(self.attrs.len() + attrs.len());
        all.extend_from_slice(&self.attrs);
        all.extend(attrs);

        let event = Event {
            name: format!("{}{}", self.config.prefix, name),
            severity,
            attrs: all,
        };
        sink.log(ctx, &event);
    }

    /// Start timing a call. The returned guard emits exactly one event.
    pub(crate) fn call(
        &self,
        ctx: &Context,
        severity: Severity,
        category: Category,
        op: &str,
    ) -> Call {
        Call {
            logger: self.clone(),
            ctx: ctx.clone(),
            severity,
            name: format!("{}{}", self.category_prefix(category), op),
            started: Some(Instant::now()),
            attrs: Vec::new(),
            pending: true,
        }
    }
}

/// Guard for one in-flight call.
///
/// [`Call::finish`] logs the outcome. A guard dropped before `finish`, for
/// example when the caller drops the future mid-call, still logs its event
/// with `abandoned=true`.
pub(crate) struct Call {
    logger: EventLogger,
    ctx: Context,
    severity: Severity,
    name: String,
    started: Option<Instant>,
    attrs: Vec<Attr>,
    pending: bool,
}

impl Call {
    /// Measure from `started` instead of call entry. `None` omits the duration.
    pub(crate) fn since(mut self, started: Option<Instant>) -> Self {
        self.started = started;
        self
    }

    pub(crate) fn attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub(crate) fn finish<T>(mut self, result: Result<T>) -> Result<T> {
        self.emit(result.as_ref().err());
        result
    }

    fn emit(&mut self, err: Option<&DriverError>) {
        if !self.pending {
            return;
        }
        self.pending = false;
        let attrs = std::mem::take(&mut self.attrs);
        self.logger
            .log(&self.ctx, self.severity, &self.name, self.started, err, attrs);
    }
}

impl Drop for Call {
    fn drop(&mut self) {
        if self.pending {
            self.attrs.push(Attr::bool("abandoned", true));
            self.emit(None);
        }
    }
}
