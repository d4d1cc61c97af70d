//! Adapters between an externally owned object's property and an internal
//! representation.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use serde_json::{Map as JsonMap, Value as JsonValue};

use super::error::{Error, Result};

/// An object whose properties can be bound.
pub trait Bindable {
    /// True if this object is a plain record whose properties may be bound.
    fn is_bindable(&self) -> bool {
        true
    }

    /// Read a property. `None` if it does not exist.
    fn read_property(&self, key: &str) -> Option<JsonValue>;

    /// Write a property.
    fn write_property(&mut self, key: &str, value: JsonValue) -> Result<()>;
}

impl Bindable for JsonMap<String, JsonValue> {
    fn read_property(&self, key: &str) -> Option<JsonValue> {
        self.get(key).cloned()
    }

    fn write_property(&mut self, key: &str, value: JsonValue) -> Result<()> {
        self.insert(key.to_string(), value);
        Ok(())
    }
}

impl Bindable for JsonValue {
    fn is_bindable(&self) -> bool {
        self.is_object()
    }

    fn read_property(&self, key: &str) -> Option<JsonValue> {
        self.as_object().and_then(|o| o.get(key).cloned())
    }

    fn write_property(&mut self, key: &str, value: JsonValue) -> Result<()> {
        match self.as_object_mut() {
            Some(o) => {
                o.insert(key.to_string(), value);
                Ok(())
            }
            None => Err(Error::NotBindable),
        }
    }
}

/// Shared handle to a bound object, as held by the host.
pub type BindableRef = Rc<RefCell<dyn Bindable>>;

/// Wrap a value into a bindable handle.
pub fn bindable<B: Bindable + 'static>(b: B) -> Rc<RefCell<B>> {
    Rc::new(RefCell::new(b))
}

/// A read-only reference to `(object, key)`. It never keeps the object
/// alive.
#[derive(Clone)]
pub struct BindingTarget {
    /// The bound object.
    object: Weak<RefCell<dyn Bindable>>,
    /// The bound property.
    key: String,
}

impl fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTarget")
            .field("key", &self.key)
            .field("alive", &(self.object.strong_count() > 0))
            .finish()
    }
}

impl BindingTarget {
    /// Bind a property. Fails if the object is not a record, or if the
    /// property does not exist.
    pub fn new(object: &BindableRef, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        {
            let o = object.borrow();
            if !o.is_bindable() {
                return Err(Error::NotBindable);
            }
            if o.read_property(&key).is_none() {
                return Err(Error::PropertyNotFound { name: key });
            }
        }
        Ok(Self {
            object: Rc::downgrade(object),
            key,
        })
    }

    /// The bound property name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// True while the bound object is alive.
    pub fn is_alive(&self) -> bool {
        self.object.strong_count() > 0
    }

    /// Upgrade the object handle.
    fn object(&self) -> Result<BindableRef> {
        self.object.upgrade().ok_or(Error::NotBindable)
    }

    /// Read the bound property.
    pub fn read(&self) -> Result<JsonValue> {
        self.object()?
            .borrow()
            .read_property(&self.key)
            .ok_or_else(|| Error::PropertyNotFound {
                name: self.key.clone(),
            })
    }

    /// Write the bound property.
    pub fn write(&self, value: JsonValue) -> Result<()> {
        self.object()?.borrow_mut().write_property(&self.key, value)
    }

    /// Write a sub-property of the bound property, when the bound property
    /// is itself a record.
    pub fn write_property(&self, name: &str, value: JsonValue) -> Result<()> {
        let object = self.object()?;
        let mut o = object.borrow_mut();
        let mut current = o.read_property(&self.key).ok_or_else(|| Error::PropertyNotFound {
            name: self.key.clone(),
        })?;
        current.write_property(name, value)?;
        o.write_property(&self.key, current)
    }
}

/// Converts an external reading into the internal representation.
pub type BindingReader<T> = Rc<dyn Fn(&JsonValue) -> T>;

/// Writes an internal value out through a target.
pub type BindingWriter<T> = Rc<dyn Fn(&BindingTarget, &T) -> Result<()>>;

/// A writable binding.
pub struct ReadWriteBinding<T> {
    /// The bound property.
    pub target: BindingTarget,
    /// External to internal.
    reader: BindingReader<T>,
    /// Internal to external.
    writer: BindingWriter<T>,
}

impl<T> Clone for ReadWriteBinding<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            reader: self.reader.clone(),
            writer: self.writer.clone(),
        }
    }
}

impl<T> ReadWriteBinding<T> {
    /// Construct a binding.
    pub fn new(target: BindingTarget, reader: BindingReader<T>, writer: BindingWriter<T>) -> Self {
        Self {
            target,
            reader,
            writer,
        }
    }

    /// Read and convert the bound property.
    pub fn read(&self) -> Result<T> {
        Ok((self.reader)(&self.target.read()?))
    }

    /// Write an internal value out.
    pub fn write(&self, value: &T) -> Result<()> {
        (self.writer)(&self.target, value)
    }

    /// Write a raw external value, bypassing the writer. Used to restore
    /// exported state.
    pub fn inject(&self, value: JsonValue) -> Result<()> {
        self.target.write(value)
    }
}

/// A read-only binding.
pub struct ReadonlyBinding<T> {
    /// The bound property.
    pub target: BindingTarget,
    /// External to internal.
    reader: BindingReader<T>,
}

impl<T> Clone for ReadonlyBinding<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<T> ReadonlyBinding<T> {
    /// Construct a binding.
    pub fn new(target: BindingTarget, reader: BindingReader<T>) -> Self {
        Self { target, reader }
    }

    /// Read and convert the bound property.
    pub fn read(&self) -> Result<T> {
        Ok((self.reader)(&self.target.read()?))
    }
}

/// Writes the value as-is. The default writer for primitives.
pub fn write_primitive<T: Clone + Into<JsonValue>>(target: &BindingTarget, value: &T) -> Result<()> {
    target.write(value.clone().into())
}
