use super::error::CompileError;
use super::functions::{FUNCTIONS, Function, MAX_ARITY, POINT_FUNCTIONS};
use super::parser::{BinaryOp, Node, parse};
use std::collections::HashMap;

const AXES: [char; 3] = ['x', 'y', 'z'];

/// Names an expression may refer to, besides its own intermediate definitions.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary<'a> {
    pub point_count: usize,
    pub overall_parameters: &'a [String],
    pub per_term_parameters: &'a [String],
}

/// Values bound to the variables of a [`CompiledExpression`] for one term.
#[derive(Debug, Clone, Copy)]
pub struct TermInputs<'a> {
    /// Flat `[x1, y1, z1, x2, ...]` coordinates, `3 * point_count` long.
    pub coordinates: &'a [f64],
    pub overall: &'a [f64],
    pub per_term: &'a [f64],
}

/// Scratch buffers reused across evaluations.
#[derive(Debug, Default, Clone)]
pub struct Workspace {
    values: Vec<f64>,
    adjoints: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
enum Instruction {
    Constant(f64),
    Coordinate(usize),
    Overall(usize),
    PerTerm(usize),
    Negate(usize),
    Binary(BinaryOp, usize, usize),
    Call(Function, Box<[usize]>),
}

/// An expression compiled to a flat instruction tape in evaluation order.
///
/// Every instruction refers to its operands by tape index, so shared
/// subexpressions (intermediate definitions, repeated variables) are evaluated
/// once. Gradients with respect to the coordinates are obtained by one reverse
/// sweep over the tape.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    instructions: Vec<Instruction>,
    // Whether an instruction depends on any coordinate; the reverse sweep skips the rest.
    active: Vec<bool>,
    root: usize,
    coordinate_count: usize,
}

impl CompiledExpression {
    pub fn compile(source: &str, vocabulary: &Vocabulary<'_>) -> Result<Self, CompileError> {
        let parsed = parse(source)?;
        let mut compiler = Compiler {
            vocabulary,
            definitions: parsed
                .definitions
                .iter()
                .map(|(name, node)| (name.as_str(), node))
                .collect(),
            instructions: Vec::new(),
            active: Vec::new(),
            bindings: HashMap::new(),
            resolving: Vec::new(),
        };
        let root = compiler.emit(&parsed.main)?;
        Ok(Self {
            instructions: compiler.instructions,
            active: compiler.active,
            root,
            coordinate_count: 3 * vocabulary.point_count,
        })
    }

    pub fn coordinate_count(&self) -> usize {
        self.coordinate_count
    }

    pub fn value(&self, inputs: &TermInputs<'_>, workspace: &mut Workspace) -> f64 {
        self.forward(inputs, &mut workspace.values);
        workspace.values[self.root]
    }

    /// Evaluates the expression and adds its partial derivatives with respect to
    /// every coordinate into `gradient`. Returns the value.
    pub fn accumulate_gradient(
        &self,
        inputs: &TermInputs<'_>,
        workspace: &mut Workspace,
        gradient: &mut [f64],
    ) -> f64 {
        let Workspace { values, adjoints } = workspace;
        self.forward(inputs, values);

        adjoints.clear();
        adjoints.resize(self.instructions.len(), 0.0);
        adjoints[self.root] = 1.0;

        let mut arg_values = [0.0; MAX_ARITY];
        let mut partials = [0.0; MAX_ARITY];

        for index in (0..=self.root).rev() {
            let seed = adjoints[index];
            if seed == 0.0 || !self.active[index] {
                continue;
            }
            match &self.instructions[index] {
                Instruction::Coordinate(c) => gradient[*c] += seed,
                Instruction::Constant(_) | Instruction::Overall(_) | Instruction::PerTerm(_) => {}
                Instruction::Negate(a) => adjoints[*a] -= seed,
                Instruction::Binary(op, a, b) => {
                    let (a, b) = (*a, *b);
                    let (x, y) = (values[a], values[b]);
                    let (da, db) = match op {
                        BinaryOp::Add => (1.0, 1.0),
                        BinaryOp::Subtract => (1.0, -1.0),
                        BinaryOp::Multiply => (y, x),
                        BinaryOp::Divide => (1.0 / y, -values[index] / y),
                        BinaryOp::Power => {
                            let db = if self.active[b] {
                                values[index] * x.ln()
                            } else {
                                0.0
                            };
                            (y * x.powf(y - 1.0), db)
                        }
                    };
                    if self.active[a] {
                        adjoints[a] += seed * da;
                    }
                    if self.active[b] {
                        adjoints[b] += seed * db;
                    }
                }
                Instruction::Call(function, operands) => {
                    let n = operands.len();
                    for (slot, &operand) in arg_values.iter_mut().zip(operands.iter()) {
                        *slot = values[operand];
                    }
                    function.partials(&arg_values[..n], values[index], &mut partials[..n]);
                    for (&operand, &partial) in operands.iter().zip(partials.iter()) {
                        if self.active[operand] {
                            adjoints[operand] += seed * partial;
                        }
                    }
                }
            }
        }

        values[self.root]
    }

    fn forward(&self, inputs: &TermInputs<'_>, values: &mut Vec<f64>) {
        values.clear();
        let mut arg_values = [0.0; MAX_ARITY];
        for instruction in &self.instructions[..=self.root] {
            let value = match instruction {
                Instruction::Constant(v) => *v,
                Instruction::Coordinate(i) => inputs.coordinates[*i],
                Instruction::Overall(i) => inputs.overall[*i],
                Instruction::PerTerm(i) => inputs.per_term[*i],
                Instruction::Negate(a) => -values[*a],
                Instruction::Binary(op, a, b) => {
                    let (x, y) = (values[*a], values[*b]);
                    match op {
                        BinaryOp::Add => x + y,
                        BinaryOp::Subtract => x - y,
                        BinaryOp::Multiply => x * y,
                        BinaryOp::Divide => x / y,
                        BinaryOp::Power => x.powf(y),
                    }
                }
                Instruction::Call(function, operands) => {
                    for (slot, &operand) in arg_values.iter_mut().zip(operands.iter()) {
                        *slot = values[operand];
                    }
                    function.evaluate(&arg_values[..operands.len()])
                }
            };
            values.push(value);
        }
    }
}

struct Compiler<'a> {
    vocabulary: &'a Vocabulary<'a>,
    definitions: HashMap<&'a str, &'a Node>,
    instructions: Vec<Instruction>,
    active: Vec<bool>,
    bindings: HashMap<String, usize>,
    resolving: Vec<String>,
}

impl<'a> Compiler<'a> {
    fn push(&mut self, instruction: Instruction) -> usize {
        let active = match &instruction {
            Instruction::Coordinate(_) => true,
            Instruction::Constant(_) | Instruction::Overall(_) | Instruction::PerTerm(_) => false,
            Instruction::Negate(a) => self.active[*a],
            Instruction::Binary(_, a, b) => self.active[*a] || self.active[*b],
            Instruction::Call(_, operands) => operands.iter().any(|&o| self.active[o]),
        };
        self.instructions.push(instruction);
        self.active.push(active);
        self.instructions.len() - 1
    }

    fn emit(&mut self, node: &'a Node) -> Result<usize, CompileError> {
        match node {
            Node::Number(value) => Ok(self.push(Instruction::Constant(*value))),
            Node::Variable(name) => self.resolve(name),
            Node::Negate(inner) => {
                let a = self.emit(inner)?;
                Ok(self.push(Instruction::Negate(a)))
            }
            Node::Binary(op, lhs, rhs) => {
                let a = self.emit(lhs)?;
                let b = self.emit(rhs)?;
                Ok(self.push(Instruction::Binary(*op, a, b)))
            }
            Node::Call(name, args) => self.emit_call(name, args),
        }
    }

    fn emit_call(&mut self, name: &'a str, args: &'a [Node]) -> Result<usize, CompileError> {
        if let Some(&function) = POINT_FUNCTIONS.get(name) {
            let expected = function.arity() / 3;
            check_argument_count(name, expected, args.len())?;
            let mut operands = Vec::with_capacity(function.arity());
            for (position, arg) in args.iter().enumerate() {
                let point = match arg {
                    Node::Variable(point_name) => {
                        numbered_name(point_name, 'p', self.vocabulary.point_count)
                            .ok_or_else(|| CompileError::NotAPoint(point_name.clone()))?
                    }
                    _ => {
                        return Err(CompileError::NotAPoint(format!(
                            "argument {} of {}",
                            position + 1,
                            name
                        )));
                    }
                };
                for axis in AXES {
                    operands.push(self.resolve(&format!("{}{}", axis, point + 1))?);
                }
            }
            return Ok(self.push(Instruction::Call(function, operands.into_boxed_slice())));
        }

        let function = *FUNCTIONS
            .get(name)
            .ok_or_else(|| CompileError::UnknownFunction(name.to_string()))?;
        check_argument_count(name, function.arity(), args.len())?;
        let operands = args
            .iter()
            .map(|arg| self.emit(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.push(Instruction::Call(function, operands.into_boxed_slice())))
    }

    fn resolve(&mut self, name: &str) -> Result<usize, CompileError> {
        if let Some(&index) = self.bindings.get(name) {
            return Ok(index);
        }

        let index = if let Some(&definition) = self.definitions.get(name) {
            if self.resolving.iter().any(|pending| pending == name) {
                return Err(CompileError::CircularDefinition(name.to_string()));
            }
            self.resolving.push(name.to_string());
            let index = self.emit(definition)?;
            self.resolving.pop();
            index
        } else {
            let vocabulary = self.vocabulary;
            let instruction = if let Some(i) = position_of(vocabulary.per_term_parameters, name) {
                Instruction::PerTerm(i)
            } else if let Some(i) = position_of(vocabulary.overall_parameters, name) {
                Instruction::Overall(i)
            } else if let Some(i) = coordinate_index(name, vocabulary.point_count) {
                Instruction::Coordinate(i)
            } else {
                return Err(CompileError::UnknownVariable(name.to_string()));
            };
            self.push(instruction)
        };

        self.bindings.insert(name.to_string(), index);
        Ok(index)
    }
}

fn check_argument_count(name: &str, expected: usize, found: usize) -> Result<(), CompileError> {
    if expected == found {
        Ok(())
    } else {
        Err(CompileError::WrongArgumentCount {
            name: name.to_string(),
            expected,
            found,
        })
    }
}

fn position_of(names: &[String], name: &str) -> Option<usize> {
    names.iter().position(|candidate| candidate == name)
}

/// Parses `<prefix><n>` with `1 <= n <= limit` and returns the zero-based `n - 1`.
fn numbered_name(name: &str, prefix: char, limit: usize) -> Option<usize> {
    let digits = name.strip_prefix(prefix)?;
    if digits.is_empty() || digits.starts_with('0') || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let n: usize = digits.parse().ok()?;
    (n <= limit).then(|| n - 1)
}

fn coordinate_index(name: &str, point_count: usize) -> Option<usize> {
    let first = name.chars().next()?;
    let axis = AXES.iter().position(|&a| a == first)?;
    numbered_name(name, first, point_count).map(|point| 3 * point + axis)
}

/// Whether `name` denotes a coordinate (`x1`, `z4`, ...) or a point (`p2`, ...)
/// for an expression over `point_count` points.
pub(crate) fn is_reserved_name(name: &str, point_count: usize) -> bool {
    coordinate_index(name, point_count).is_some()
        || numbered_name(name, 'p', point_count).is_some()
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
