//! User transformation functions.

use tableflow_sdk::value::Value;

/// A transformation invoked between the source and destination plugins.
///
/// `call` receives one value per declared parameter (a frame, null, or list
/// of those) and returns one value per declared output.
pub trait UserFunction {
    fn name(&self) -> &str;

    fn parameters(&self) -> &[String];

    fn outputs(&self) -> &[String];

    /// # Errors
    ///
    /// Any failure of the transformation itself.
    fn call(&mut self, inputs: Vec<Value>) -> anyhow::Result<Vec<Value>>;
}

/// [`UserFunction`] backed by a closure.
pub struct FnFunction<F> {
    name: String,
    parameters: Vec<String>,
    outputs: Vec<String>,
    body: F,
}

impl<F> FnFunction<F>
where
    F: FnMut(Vec<Value>) -> anyhow::Result<Vec<Value>>,
{
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<String>,
        outputs: Vec<String>,
        body: F,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            outputs,
            body,
        }
    }
}

impl<F> UserFunction for FnFunction<F>
where
    F: FnMut(Vec<Value>) -> anyhow::Result<Vec<Value>>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn call(&mut self, inputs: Vec<Value>) -> anyhow::Result<Vec<Value>> {
        (self.body)(inputs)
    }
}

/// Function body forwarding every input unchanged.
pub type IdentityBody = fn(Vec<Value>) -> anyhow::Result<Vec<Value>>;

/// Function forwarding parameter *i* to output *i*, outputs named after
/// the parameters.
pub fn identity(name: impl Into<String>, parameters: Vec<String>) -> FnFunction<IdentityBody> {
    let outputs = parameters.clone();
    let body: IdentityBody = Ok;
    FnFunction::new(name, parameters, outputs, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_forwards_inputs() {
        let mut f = identity("copy", vec!["a".into(), "b".into()]);
        assert_eq!(f.name(), "copy");
        assert_eq!(f.outputs(), f.parameters());
        let out = f.call(vec![Value::Null, Value::list(Vec::<Value>::new())]).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0].is_null());
    }

    #[test]
    fn closure_function_can_fail() {
        let mut f = FnFunction::new("boom", vec![], vec![], |_| anyhow::bail!("bad input"));
        assert_eq!(f.call(Vec::new()).unwrap_err().to_string(), "bad input");
    }
}
