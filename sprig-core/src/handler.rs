// Typed adapters between controller methods and the dispatcher
//
// A controller method is stored as a closure `Fn(&mut C, Args) -> R`. The
// dispatcher only sees positional `serde_json::Value`s and a `Reply`, so:
// - `MethodArgs` turns the bound value list into the method's argument tuple
//   and reports the declared kind of every position,
// - `IntoReply` turns the method's return value into either "no value" or
//   serialized JSON text.
// Both are monomorphized per route when the route is declared, then erased
// behind `Invoker<C>`.

use crate::binder::Bindable;
use crate::codec;
use crate::http::Json;
use crate::metadata::ValueKind;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Type-erased controller method: receives the instance and the bound values.
pub type Invoker<C> = Arc<dyn Fn(&mut C, Vec<Value>) -> Result<Reply> + Send + Sync>;

/// Outcome of a successful invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The method declares no return value
    Empty,
    /// The serialized return value
    Json(String),
}

/// Argument tuple of a controller method.
pub trait MethodArgs: Sized + Send + 'static {
    /// Number of declared parameters
    const ARITY: usize;

    /// Declared kind of every parameter, in order
    fn kinds() -> Vec<ValueKind>;

    /// Convert the bound values into the argument tuple
    fn from_values(values: Vec<Value>) -> Result<Self>;
}

impl MethodArgs for () {
    const ARITY: usize = 0;

    fn kinds() -> Vec<ValueKind> {
        Vec::new()
    }

    fn from_values(_values: Vec<Value>) -> Result<Self> {
        Ok(())
    }
}

fn convert<T: Bindable>(value: Option<Value>, position: usize) -> Result<T> {
    let value = value.unwrap_or(Value::Null);
    // `?name=123` decodes to a number; a string-typed target still takes it as text
    let as_text = match &value {
        Value::Number(n) => Some(Value::String(n.to_string())),
        Value::Bool(b) => Some(Value::String(b.to_string())),
        _ => None,
    };

    serde_json::from_value::<T>(value)
        .or_else(|e| match as_text {
            Some(text) => serde_json::from_value::<T>(text).map_err(|_| e),
            None => Err(e),
        })
        .map_err(|e| {
            Error::Binding(format!(
                "argument {} cannot be converted to {}: {}",
                position,
                std::any::type_name::<T>(),
                e
            ))
        })
}

macro_rules! impl_method_args {
    ($arity:expr; $($ty:ident => $idx:tt),+) => {
        impl<$($ty: Bindable),+> MethodArgs for ($($ty,)+) {
            const ARITY: usize = $arity;

            fn kinds() -> Vec<ValueKind> {
                vec![$($ty::value_kind()),+]
            }

            fn from_values(values: Vec<Value>) -> Result<Self> {
                let mut values = values.into_iter();
                Ok(($(convert::<$ty>(values.next(), $idx)?,)+))
            }
        }
    };
}

impl_method_args!(1; A => 0);
impl_method_args!(2; A => 0, B => 1);
impl_method_args!(3; A => 0, B => 1, D => 2);
impl_method_args!(4; A => 0, B => 1, D => 2, E => 3);
impl_method_args!(5; A => 0, B => 1, D => 2, E => 3, F => 4);
impl_method_args!(6; A => 0, B => 1, D => 2, E => 3, F => 4, G => 5);

/// Return type of a controller method.
///
/// `()` means "no value" and produces the fixed success message. Fallible
/// methods return `Result<T, E>`; an `Err` becomes an invocation error.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply>;
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply> {
        Ok(Reply::Empty)
    }
}

macro_rules! impl_into_reply_serialize {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Result<Reply> {
                    codec::serialize(&self).map(Reply::Json)
                }
            }
        )*
    };
}

impl_into_reply_serialize!(
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    isize,
    usize,
    f32,
    f64,
    Value,
);

impl<T: Serialize> IntoReply for Vec<T> {
    fn into_reply(self) -> Result<Reply> {
        codec::serialize(&self).map(Reply::Json)
    }
}

impl<T: Serialize> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply> {
        codec::serialize(&self).map(Reply::Json)
    }
}

impl<K: Serialize, V: Serialize> IntoReply for HashMap<K, V> {
    fn into_reply(self) -> Result<Reply> {
        codec::serialize(&self).map(Reply::Json)
    }
}

impl<K: Serialize, V: Serialize> IntoReply for BTreeMap<K, V> {
    fn into_reply(self) -> Result<Reply> {
        codec::serialize(&self).map(Reply::Json)
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply> {
        codec::serialize(&self.0).map(Reply::Json)
    }
}

impl<T: IntoReply, E: std::fmt::Display> IntoReply for std::result::Result<T, E> {
    fn into_reply(self) -> Result<Reply> {
        match self {
            Ok(value) => value.into_reply(),
            Err(err) => Err(Error::Invocation(err.to_string())),
        }
    }
}

/// Wrap a typed controller method into an [`Invoker`].
pub fn invoker<C, A, R, F>(method: F) -> Invoker<C>
where
    C: 'static,
    A: MethodArgs,
    R: IntoReply + 'static,
    F: Fn(&mut C, A) -> R + Send + Sync + 'static,
{
    Arc::new(move |instance: &mut C, values: Vec<Value>| {
        let args = A::from_values(values)?;
        method(instance, args).into_reply()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn test_arity_and_kinds() {
        assert_eq!(<() as MethodArgs>::ARITY, 0);
        assert_eq!(<(i32, String) as MethodArgs>::ARITY, 2);
        assert_eq!(
            <(i32, String, bool) as MethodArgs>::kinds(),
            vec![ValueKind::Int, ValueKind::String, ValueKind::Boolean]
        );
    }

    #[test]
    fn test_from_values() {
        let (n, s, m) = <(i32, String, Option<BTreeMap<String, String>>)>::from_values(vec![
            json!(5),
            json!("hi"),
            json!({"a": "x"}),
        ])
        .unwrap();

        assert_eq!(n, 5);
        assert_eq!(s, "hi");
        assert_eq!(m.unwrap()["a"], "x");
    }

    #[test]
    fn test_scalar_text_converts_to_string_targets() {
        let (name, flag) =
            <(Option<String>, Option<String>)>::from_values(vec![json!(123), json!(true)]).unwrap();
        assert_eq!(name.as_deref(), Some("123"));
        assert_eq!(flag.as_deref(), Some("true"));

        let (n,) = <(Option<i32>,)>::from_values(vec![json!(7)]).unwrap();
        assert_eq!(n, Some(7));
    }

    #[test]
    fn test_from_values_type_mismatch() {
        let err = <(u8,)>::from_values(vec![json!(300)]).unwrap_err();
        assert!(matches!(err, Error::Binding(_)));
    }

    #[test]
    fn test_replies() {
        assert_eq!(().into_reply().unwrap(), Reply::Empty);
        assert_eq!(
            "Regular mapping is active!".into_reply().unwrap(),
            Reply::Json("\"Regular mapping is active!\"".into())
        );
        assert_eq!(
            vec!["x:processed".to_string()].into_reply().unwrap(),
            Reply::Json(r#"["x:processed"]"#.into())
        );
        assert_eq!(Option::<i32>::None.into_reply().unwrap(), Reply::Json("null".into()));

        let failed: std::result::Result<String, String> = Err("no such user".into());
        assert!(matches!(failed.into_reply(), Err(Error::Invocation(msg)) if msg == "no such user"));
    }

    #[test]
    fn test_invoker_mutates_instance() {
        let call = invoker(|c: &mut Counter, (step,): (u32,)| {
            c.hits += step;
            c.hits
        });

        let mut counter = Counter::default();
        assert_eq!(call(&mut counter, vec![json!(2)]).unwrap(), Reply::Json("2".into()));
        assert_eq!(call(&mut counter, vec![json!(3)]).unwrap(), Reply::Json("5".into()));
        assert_eq!(counter.hits, 5);
    }
}
