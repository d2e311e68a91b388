//! Evaluation of parsed statements against a [`Userland`].

use serde_json::Value;
use wsdom_dom::{DomCapabilities, NodeId, PropertyValue};
use wsdom_protocols::LogLevel;

use super::parser::{number_value, Expr, Statement};
use crate::error::EvalError;
use crate::userland::Userland;

/// Runtime value.
#[derive(Debug, Clone, PartialEq)]
enum Object {
    Json(Value),
    Node(NodeId),
    Document,
    Window,
    LocalStorage,
    SessionStorage,
    Console,
}

impl Object {
    fn into_json(self) -> Value {
        match self {
            Self::Json(value) => value,
            // Host objects stringify like plain objects without own data.
            _ => Value::Object(serde_json::Map::new()),
        }
    }
}

fn js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => PropertyValue::from_json(other).to_js_string(),
    }
}

fn string_arg(args: &[Object], index: usize, method: &str) -> Result<String, EvalError> {
    match args.get(index) {
        Some(Object::Json(value)) => Ok(js_string(value)),
        Some(_) => Err(EvalError::Type(format!(
            "argument {} of {} must be a primitive",
            index + 1,
            method
        ))),
        None => Err(EvalError::Type(format!(
            "{} requires at least {} argument(s)",
            method,
            index + 1
        ))),
    }
}

fn node_arg(args: &[Object], index: usize, method: &str) -> Result<NodeId, EvalError> {
    match args.get(index) {
        Some(Object::Node(node)) => Ok(*node),
        _ => Err(EvalError::Type(format!(
            "argument {} of {} is not a Node",
            index + 1,
            method
        ))),
    }
}

fn void() -> Object {
    Object::Json(Value::Null)
}

fn optional_node(node: Option<NodeId>) -> Object {
    node.map_or(Object::Json(Value::Null), Object::Node)
}

pub(crate) struct Evaluator<'a> {
    userland: &'a mut Userland,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(userland: &'a mut Userland) -> Self {
        Self { userland }
    }

    /// Run `statements`, returning the value of the last one.
    pub(crate) fn run(&mut self, statements: &[Statement]) -> Result<Value, EvalError> {
        let mut last = void();
        for statement in statements {
            last = match statement {
                Statement::Expr(expr) => self.eval(expr)?,
                Statement::Assign { target, value } => self.assign(target, value)?,
            };
        }
        Ok(last.into_json())
    }

    fn eval(&mut self, expr: &Expr) -> Result<Object, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(Object::Json(value.clone())),
            Expr::Ident(name) => self.global(name),
            Expr::Member { object, name } => {
                let object = self.eval(object)?;
                self.get(object, name)
            }
            Expr::Call { callee, args } => {
                let Expr::Member { object, name } = callee.as_ref() else {
                    self.eval(callee)?;
                    return Err(EvalError::Type("expression is not a function".to_string()));
                };
                let object = self.eval(object)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(object, name, &args)
            }
        }
    }

    fn global(&self, name: &str) -> Result<Object, EvalError> {
        match name {
            "document" => Ok(Object::Document),
            "window" | "globalThis" | "self" => Ok(Object::Window),
            "localStorage" => Ok(Object::LocalStorage),
            "sessionStorage" => Ok(Object::SessionStorage),
            "console" => Ok(Object::Console),
            _ => Err(EvalError::Reference(name.to_string())),
        }
    }

    fn get(&self, object: Object, name: &str) -> Result<Object, EvalError> {
        let doc = self.userland.document();
        let value = match object {
            Object::Window => match name {
                "window" | "self" => Object::Window,
                _ => self.global(name).unwrap_or_else(|_| void()),
            },
            Object::Document => match name {
                "body" => optional_node(doc.body()),
                "head" => optional_node(doc.head()),
                "documentElement" => optional_node(doc.document_element()),
                "title" => Object::Json(Value::String(doc.title())),
                "URL" => Object::Json(Value::String(self.userland.url().to_string())),
                _ => void(),
            },
            Object::Node(node) => Object::Json(match doc.get_property(node, name) {
                PropertyValue::Number(n) => number_value(n),
                other => other.to_json(),
            }),
            Object::LocalStorage | Object::SessionStorage => {
                let storage = if object == Object::LocalStorage {
                    self.userland.local_storage()
                } else {
                    self.userland.session_storage()
                };
                match name {
                    "length" => Object::Json(Value::from(storage.len())),
                    _ => Object::Json(
                        storage
                            .get_item(name)
                            .map_or(Value::Null, |v| Value::String(v.to_string())),
                    ),
                }
            }
            Object::Console => void(),
            Object::Json(Value::Null) => {
                return Err(EvalError::Type(format!(
                    "Cannot read properties of null (reading '{}')",
                    name
                )));
            }
            Object::Json(Value::String(s)) if name == "length" => {
                Object::Json(Value::from(s.encode_utf16().count()))
            }
            Object::Json(_) => void(),
        };
        Ok(value)
    }

    fn assign(&mut self, target: &Expr, value: &Expr) -> Result<Object, EvalError> {
        let Expr::Member { object, name } = target else {
            return Err(EvalError::Syntax(
                "invalid left-hand side in assignment".to_string(),
            ));
        };
        let object = self.eval(object)?;
        let value = self.eval(value)?;
        let Object::Json(json) = &value else {
            return Err(EvalError::Type(format!(
                "cannot assign a host object to '{}'",
                name
            )));
        };

        match object {
            Object::Node(node) => {
                self.userland
                    .dom_mut()
                    .set_property(node, name, PropertyValue::from_json(json))?;
            }
            Object::Document if name == "title" => {
                let doc = self.userland.document();
                let title = doc.get_elements_by_tag_name("title").first().copied();
                if let Some(title) = title {
                    self.userland.dom_mut().set_property(
                        title,
                        "textContent",
                        PropertyValue::from(js_string(json)),
                    )?;
                }
            }
            Object::LocalStorage => self.userland.local_storage_mut().set_item(name, js_string(json)),
            Object::SessionStorage => {
                self.userland.session_storage_mut().set_item(name, js_string(json))
            }
            Object::Json(Value::Null) => {
                return Err(EvalError::Type(format!(
                    "Cannot set properties of null (setting '{}')",
                    name
                )));
            }
            _ => {}
        }
        Ok(value)
    }

    fn call(&mut self, object: Object, method: &str, args: &[Object]) -> Result<Object, EvalError> {
        match object {
            Object::Document => self.call_document(method, args),
            Object::Node(node) => self.call_node(node, method, args),
            Object::LocalStorage | Object::SessionStorage => {
                self.call_storage(object == Object::LocalStorage, method, args)
            }
            Object::Console => {
                let level = match method {
                    "log" => LogLevel::Log,
                    "debug" => LogLevel::Debug,
                    "info" => LogLevel::Info,
                    "warn" => LogLevel::Warn,
                    "error" => LogLevel::Error,
                    _ => return Err(not_a_function("console", method)),
                };
                let args: Vec<Value> = args.iter().cloned().map(Object::into_json).collect();
                self.userland.console(level, &args);
                Ok(void())
            }
            Object::Window => match method {
                "postMessage" => {
                    let message = args.first().cloned().map_or(Value::Null, Object::into_json);
                    self.userland.post_message(&message);
                    Ok(void())
                }
                _ => Err(not_a_function("window", method)),
            },
            Object::Json(Value::Null) => Err(EvalError::Type(format!(
                "Cannot read properties of null (reading '{}')",
                method
            ))),
            Object::Json(_) => Err(not_a_function("value", method)),
        }
    }

    fn call_document(&mut self, method: &str, args: &[Object]) -> Result<Object, EvalError> {
        match method {
            "getElementById" => {
                let id = string_arg(args, 0, method)?;
                Ok(optional_node(self.userland.document().get_element_by_id(&id)))
            }
            "createElement" => {
                let tag = string_arg(args, 0, method)?.to_ascii_lowercase();
                Ok(Object::Node(self.userland.dom_mut().create_element(&tag, None)))
            }
            "createTextNode" => {
                let data = string_arg(args, 0, method)?;
                Ok(Object::Node(self.userland.dom_mut().create_text_node(&data)))
            }
            "createDocumentFragment" => {
                Ok(Object::Node(self.userland.dom_mut().create_document_fragment()))
            }
            _ => Err(not_a_function("document", method)),
        }
    }

    fn call_node(&mut self, node: NodeId, method: &str, args: &[Object]) -> Result<Object, EvalError> {
        let dom = self.userland.dom_mut();
        match method {
            "getAttribute" => {
                let name = string_arg(args, 0, method)?;
                Ok(Object::Json(
                    dom.document()
                        .get_attribute(node, &name)
                        .map_or(Value::Null, |v| Value::String(v.to_string())),
                ))
            }
            "hasAttribute" => {
                let name = string_arg(args, 0, method)?;
                Ok(Object::Json(Value::Bool(dom.document().has_attribute(node, &name))))
            }
            "setAttribute" => {
                let name = string_arg(args, 0, method)?;
                let value = string_arg(args, 1, method)?;
                dom.set_attribute(node, &name, &value)?;
                Ok(void())
            }
            "appendChild" => {
                let child = node_arg(args, 0, method)?;
                Ok(Object::Node(dom.append_child(node, child)?))
            }
            "removeChild" => {
                let child = node_arg(args, 0, method)?;
                Ok(Object::Node(dom.remove_child(node, child)?))
            }
            "remove" => {
                dom.remove(node);
                Ok(void())
            }
            "cloneNode" => {
                let deep = matches!(args.first(), Some(Object::Json(v)) if PropertyValue::from_json(v).is_truthy());
                Ok(Object::Node(dom.clone_node(node, deep)))
            }
            "normalize" => {
                dom.normalize(node);
                Ok(void())
            }
            "click" => {
                wsdom_core::click(dom, node);
                Ok(void())
            }
            _ => Err(not_a_function("node", method)),
        }
    }

    fn call_storage(&mut self, local: bool, method: &str, args: &[Object]) -> Result<Object, EvalError> {
        let storage = if local {
            self.userland.local_storage_mut()
        } else {
            self.userland.session_storage_mut()
        };
        let result = match method {
            "getItem" => {
                let key = string_arg(args, 0, method)?;
                storage
                    .get_item(&key)
                    .map_or(Value::Null, |v| Value::String(v.to_string()))
            }
            "setItem" => {
                let key = string_arg(args, 0, method)?;
                let value = string_arg(args, 1, method)?;
                storage.set_item(key, value);
                Value::Null
            }
            "removeItem" => {
                let key = string_arg(args, 0, method)?;
                storage.remove_item(&key);
                Value::Null
            }
            "clear" => {
                storage.clear();
                Value::Null
            }
            "key" => {
                let index = match args.first() {
                    Some(Object::Json(Value::Number(n))) => n.as_f64().unwrap_or(-1.0),
                    _ => 0.0,
                };
                if index < 0.0 {
                    Value::Null
                } else {
                    storage
                        .key(index as usize)
                        .map_or(Value::Null, |k| Value::String(k.to_string()))
                }
            }
            _ => return Err(not_a_function("storage", method)),
        };
        Ok(Object::Json(result))
    }
}

fn not_a_function(owner: &str, method: &str) -> EvalError {
    EvalError::Type(format!("{}.{} is not a function", owner, method))
}
