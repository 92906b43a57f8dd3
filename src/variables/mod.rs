//! Variable storage system
//!
//! Scalars and arrays live in separate namespaces, so `A` and `A(3)` are
//! distinct. Names are stored upper case; a trailing `$` marks a string name.

use crate::error::{BasicError, Result};
use std::collections::HashMap;

/// Upper bound on the element count of a single array
pub const MAX_ARRAY_ELEMENTS: usize = 1 << 20;

/// A BASIC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
}

impl Value {
    /// The value an unset variable of this name reads as
    pub fn default_for(name: &str) -> Self {
        if is_string_name(name) {
            Value::Str(String::new())
        } else {
            Value::Number(0.0)
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Get the numeric payload, or TYPE MISMATCH for strings
    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Str(_) => Err(BasicError::TypeMismatch),
        }
    }

    /// Get the string payload, or TYPE MISMATCH for numbers
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Number(_) => Err(BasicError::TypeMismatch),
        }
    }
}

/// String variables end with `$`
pub fn is_string_name(name: &str) -> bool {
    name.ends_with('$')
}

/// Check that a value fits the declared type of a name
fn check_type(name: &str, value: &Value) -> Result<()> {
    if is_string_name(name) == value.is_string() {
        Ok(())
    } else {
        Err(BasicError::TypeMismatch)
    }
}

/// Multi-dimensional array stored as a flat row-major buffer.
///
/// `DIM A(N)` allocates `N + 1` slots per axis, addressable `0..=N`.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    bounds: Vec<usize>,
    strides: Vec<usize>,
    values: Vec<Value>,
}

impl Array {
    /// Create an array with the declared upper bound of each axis
    pub fn new(name: &str, bounds: Vec<usize>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(BasicError::syntax("array needs at least one dimension"));
        }

        let mut strides = vec![0; bounds.len()];
        let mut total: usize = 1;
        for (axis, bound) in bounds.iter().enumerate().rev() {
            strides[axis] = total;
            total = bound
                .checked_add(1)
                .and_then(|extent| total.checked_mul(extent))
                .filter(|&size| size <= MAX_ARRAY_ELEMENTS)
                .ok_or(BasicError::IllegalQuantity)?;
        }

        Ok(Self {
            bounds,
            strides,
            values: vec![Value::default_for(name); total],
        })
    }

    /// Declared upper bound of each axis
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Calculate the flat index for a subscript list
    fn offset(&self, name: &str, indices: &[f64]) -> Result<usize> {
        if indices.len() != self.bounds.len() {
            return Err(BasicError::BadSubscript(name.to_string()));
        }

        let mut offset = 0;
        for ((index, bound), stride) in indices.iter().zip(&self.bounds).zip(&self.strides) {
            let index = index.trunc();
            if !(0.0..=*bound as f64).contains(&index) {
                return Err(BasicError::BadSubscript(name.to_string()));
            }
            offset += index as usize * stride;
        }
        Ok(offset)
    }
}

/// Variable storage system
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    scalars: HashMap<String, Value>,
    arrays: HashMap<String, Array>,
}

impl VariableStore {
    /// Create a new variable store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a scalar; unset names read as 0 or ""
    pub fn get(&self, name: &str) -> Value {
        self.scalars
            .get(name)
            .cloned()
            .unwrap_or_else(|| Value::default_for(name))
    }

    /// Assign a scalar, rejecting values of the wrong type
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        check_type(name, &value)?;
        self.scalars.insert(name.to_string(), value);
        Ok(())
    }

    /// Convenience accessor for numeric scalars
    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.scalars.get(name) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Convenience accessor for string scalars
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.scalars.get(name) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Check if a scalar has been assigned
    pub fn has_variable(&self, name: &str) -> bool {
        self.scalars.contains_key(name)
    }

    /// Dimension an array; each bound is the highest valid index on its axis
    pub fn dim_array(&mut self, name: &str, bounds: Vec<usize>) -> Result<()> {
        if self.arrays.contains_key(name) {
            return Err(BasicError::RedimensionedArray(name.to_string()));
        }
        let array = Array::new(name, bounds)?;
        self.arrays.insert(name.to_string(), array);
        Ok(())
    }

    pub fn get_array(&self, name: &str) -> Option<&Array> {
        self.arrays.get(name)
    }

    pub fn has_array(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Read an array element
    pub fn get_array_element(&self, name: &str, indices: &[f64]) -> Result<Value> {
        let array = self
            .arrays
            .get(name)
            .ok_or_else(|| BasicError::BadSubscript(name.to_string()))?;
        let offset = array.offset(name, indices)?;
        Ok(array.values[offset].clone())
    }

    /// Write an array element
    pub fn set_array_element(&mut self, name: &str, indices: &[f64], value: Value) -> Result<()> {
        check_type(name, &value)?;
        let array = self
            .arrays
            .get_mut(name)
            .ok_or_else(|| BasicError::BadSubscript(name.to_string()))?;
        let offset = array.offset(name, indices)?;
        array.values[offset] = value;
        Ok(())
    }

    /// Clear all scalars and arrays
    pub fn clear(&mut self) {
        self.scalars.clear();
        self.arrays.clear();
    }
}
