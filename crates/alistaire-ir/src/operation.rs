//! Operations applied to slots.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::slot::SlotId;

/// The kind of an operation, with its angle parameters where it has any.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperationKind {
    /// Identity.
    I,
    /// Pauli-X (bit flip).
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z (phase flip).
    Z,
    /// Hadamard.
    H,
    /// S (sqrt(Z)).
    S,
    /// S-dagger.
    Sdg,
    /// T (fourth root of Z).
    T,
    /// T-dagger.
    Tdg,
    /// Rotation around X, radians.
    Rx(f64),
    /// Rotation around Y, radians.
    Ry(f64),
    /// Rotation around Z, radians.
    Rz(f64),
    /// Phase, radians.
    P(f64),
    /// Controlled-X: links a control slot to a target slot.
    CX,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Exchange two slots.
    Swap,
    /// Toffoli.
    CCX,
    /// Fredkin.
    CSwap,
}

impl OperationKind {
    /// Canonical lowercase name, as used on the wire.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::I => "id",
            OperationKind::X => "x",
            OperationKind::Y => "y",
            OperationKind::Z => "z",
            OperationKind::H => "h",
            OperationKind::S => "s",
            OperationKind::Sdg => "sdg",
            OperationKind::T => "t",
            OperationKind::Tdg => "tdg",
            OperationKind::Rx(_) => "rx",
            OperationKind::Ry(_) => "ry",
            OperationKind::Rz(_) => "rz",
            OperationKind::P(_) => "p",
            OperationKind::CX => "cx",
            OperationKind::CY => "cy",
            OperationKind::CZ => "cz",
            OperationKind::Swap => "swap",
            OperationKind::CCX => "ccx",
            OperationKind::CSwap => "cswap",
        }
    }

    /// Number of target slots this operation acts on.
    #[inline]
    pub fn num_targets(&self) -> usize {
        match self {
            OperationKind::I
            | OperationKind::X
            | OperationKind::Y
            | OperationKind::Z
            | OperationKind::H
            | OperationKind::S
            | OperationKind::Sdg
            | OperationKind::T
            | OperationKind::Tdg
            | OperationKind::Rx(_)
            | OperationKind::Ry(_)
            | OperationKind::Rz(_)
            | OperationKind::P(_) => 1,

            OperationKind::CX | OperationKind::CY | OperationKind::CZ | OperationKind::Swap => 2,

            OperationKind::CCX | OperationKind::CSwap => 3,
        }
    }

    /// Angle parameters, in declaration order.
    pub fn parameters(&self) -> Vec<f64> {
        match self {
            OperationKind::Rx(theta)
            | OperationKind::Ry(theta)
            | OperationKind::Rz(theta)
            | OperationKind::P(theta) => vec![*theta],
            _ => vec![],
        }
    }

    /// Build an operation kind from its wire name and parameters.
    pub fn from_name(name: &str, params: &[f64]) -> IrResult<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let fixed = match lower.as_str() {
            "id" | "i" => Some(OperationKind::I),
            "x" => Some(OperationKind::X),
            "y" => Some(OperationKind::Y),
            "z" => Some(OperationKind::Z),
            "h" => Some(OperationKind::H),
            "s" => Some(OperationKind::S),
            "sdg" => Some(OperationKind::Sdg),
            "t" => Some(OperationKind::T),
            "tdg" => Some(OperationKind::Tdg),
            "cx" | "cnot" => Some(OperationKind::CX),
            "cy" => Some(OperationKind::CY),
            "cz" => Some(OperationKind::CZ),
            "swap" => Some(OperationKind::Swap),
            "ccx" | "toffoli" => Some(OperationKind::CCX),
            "cswap" | "fredkin" => Some(OperationKind::CSwap),
            _ => None,
        };

        if let Some(kind) = fixed {
            if !params.is_empty() {
                return Err(IrError::ParameterMismatch {
                    operation: kind.name().to_string(),
                    expected: 0,
                    got: params.len(),
                });
            }
            return Ok(kind);
        }

        let ctor: fn(f64) -> OperationKind = match lower.as_str() {
            "rx" => OperationKind::Rx,
            "ry" => OperationKind::Ry,
            "rz" => OperationKind::Rz,
            "p" | "phase" => OperationKind::P,
            _ => return Err(IrError::UnknownOperation(name.to_string())),
        };

        match params {
            [theta] if theta.is_finite() => Ok(ctor(*theta)),
            [_] => Err(IrError::NonFiniteParameter { operation: lower }),
            _ => Err(IrError::ParameterMismatch {
                operation: lower,
                expected: 1,
                got: params.len(),
            }),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.parameters();
        if params.is_empty() {
            write!(f, "{}", self.name())
        } else {
            let joined: Vec<String> = params.iter().map(ToString::to_string).collect();
            write!(f, "{}({})", self.name(), joined.join(","))
        }
    }
}

/// A single operation: a kind applied to an ordered list of target slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// What the operation does.
    pub kind: OperationKind,
    /// Target slots; for controlled operations the controls come first.
    pub targets: Vec<SlotId>,
}

impl Operation {
    /// Create an operation.
    pub fn new(kind: OperationKind, targets: impl IntoIterator<Item = SlotId>) -> Self {
        Self {
            kind,
            targets: targets.into_iter().collect(),
        }
    }

    /// Name of the operation kind.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Check arity, parameters, target range and target distinctness.
    pub fn check(&self, slot_count: u32) -> IrResult<()> {
        let expected = self.kind.num_targets();
        if self.targets.len() != expected {
            return Err(IrError::ArityMismatch {
                operation: self.name().to_string(),
                expected,
                got: self.targets.len(),
            });
        }

        if self.kind.parameters().iter().any(|p| !p.is_finite()) {
            return Err(IrError::NonFiniteParameter {
                operation: self.name().to_string(),
            });
        }

        for (i, slot) in self.targets.iter().enumerate() {
            if slot.0 >= slot_count {
                return Err(IrError::SlotOutOfRange {
                    operation: self.name().to_string(),
                    slot: *slot,
                    slot_count,
                });
            }
            if self.targets[..i].contains(slot) {
                return Err(IrError::DuplicateTarget {
                    operation: self.name().to_string(),
                    slot: *slot,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<String> = self.targets.iter().map(|s| s.0.to_string()).collect();
        write!(f, "{}:{}", self.kind, targets.join(","))
    }
}

/// Parses `name[(param,...)]:slot,slot,...`, e.g. `h:0`, `cx:0,1`, `rz(0.5):2`.
impl FromStr for Operation {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_err = |reason: &str| IrError::Parse {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let (head, tail) = s
            .split_once(':')
            .ok_or_else(|| parse_err("expected ':' between operation and targets"))?;

        let head = head.trim();
        let (name, params) = match head.split_once('(') {
            Some((name, rest)) => {
                let inner = rest
                    .strip_suffix(')')
                    .ok_or_else(|| parse_err("unterminated parameter list"))?;
                let params = inner
                    .split(',')
                    .map(|p| p.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| parse_err("parameters must be numbers"))?;
                (name.trim(), params)
            }
            None => (head, Vec::new()),
        };

        let kind = OperationKind::from_name(name, &params)?;

        let targets = tail
            .split(',')
            .map(|t| t.trim().parse::<u32>().map(SlotId))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| parse_err("targets must be non-negative slot indices"))?;

        Ok(Operation::new(kind, targets))
    }
}
