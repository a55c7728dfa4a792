//! Serializable constraint system.

use ark_bn254::Fr;
use ark_relations::r1cs::{
    ConstraintMatrices, ConstraintSystem, OptimizationGoal, SynthesisError, SynthesisMode,
};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::errors::{self, ProverError};
use crate::function::{Circuit, CircuitFunction};

type Matrix = Vec<Vec<(Fr, usize)>>;

/// The compiled constraint matrices of a circuit.
///
/// Produced by synthesizing in setup mode with the same optimization goal the
/// Groth16 setup uses, so its shape matches the proving key.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct R1cs {
    pub num_instance_variables: usize,
    pub num_witness_variables: usize,
    pub num_constraints: usize,
    pub a_num_non_zero: usize,
    pub b_num_non_zero: usize,
    pub c_num_non_zero: usize,
    pub a: Matrix,
    pub b: Matrix,
    pub c: Matrix,
}

impl R1cs {
    /// Compiles `function` without any witness values.
    ///
    /// Malformed circuit parameters keep their own error, only backend
    /// failures become [`ProverError::Compilation`].
    pub fn compile<C: Circuit + Clone>(function: &CircuitFunction<C>) -> errors::Result<Self> {
        let start = std::time::Instant::now();

        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        function.clone().define(cs.clone()).map_err(|e| match e {
            ProverError::Synthesis(e) => ProverError::Compilation(e),
            other => other,
        })?;
        cs.finalize();

        let matrices = cs
            .to_matrices()
            .ok_or(ProverError::Compilation(SynthesisError::MissingCS))?;
        let r1cs = Self::from(matrices);

        tracing::debug!(
            constraints = r1cs.num_constraints,
            public = r1cs.num_public_inputs(),
            witness = r1cs.num_witness_variables,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "circuit compiled"
        );
        Ok(r1cs)
    }

    /// Public inputs, not counting the constant-one wire.
    pub fn num_public_inputs(&self) -> usize {
        self.num_instance_variables.saturating_sub(1)
    }

    pub fn to_matrices(&self) -> ConstraintMatrices<Fr> {
        ConstraintMatrices {
            num_instance_variables: self.num_instance_variables,
            num_witness_variables: self.num_witness_variables,
            num_constraints: self.num_constraints,
            a_num_non_zero: self.a_num_non_zero,
            b_num_non_zero: self.b_num_non_zero,
            c_num_non_zero: self.c_num_non_zero,
            a: self.a.clone(),
            b: self.b.clone(),
            c: self.c.clone(),
        }
    }

    /// Checks that a synthesized assignment fits these matrices.
    pub fn check_shape(
        &self,
        num_instance_variables: usize,
        num_witness_variables: usize,
        num_constraints: usize,
    ) -> errors::Result<()> {
        let checks = [
            (
                "instance variables",
                self.num_instance_variables,
                num_instance_variables,
            ),
            (
                "witness variables",
                self.num_witness_variables,
                num_witness_variables,
            ),
            ("constraints", self.num_constraints, num_constraints),
        ];
        for (what, expected, got) in checks {
            if expected != got {
                return Err(ProverError::ShapeMismatch {
                    what,
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }
}

impl From<ConstraintMatrices<Fr>> for R1cs {
    fn from(m: ConstraintMatrices<Fr>) -> Self {
        Self {
            num_instance_variables: m.num_instance_variables,
            num_witness_variables: m.num_witness_variables,
            num_constraints: m.num_constraints,
            a_num_non_zero: m.a_num_non_zero,
            b_num_non_zero: m.b_num_non_zero,
            c_num_non_zero: m.c_num_non_zero,
            a: m.a,
            b: m.b,
            c: m.c,
        }
    }
}
