use rand::Rng;

/// Host-injectable evaluation of branch/condition expressions.
///
/// The engine never executes stored expression strings as code; hosts that
/// want real expressions plug in their own evaluator at this seam.
pub trait ConditionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str) -> bool;
}

/// Default evaluator: a coin toss with the configured probability of
/// `true`, ignoring the expression text.
#[derive(Debug, Clone, Copy)]
pub struct RandomCondition {
    pub probability: f64,
}

impl Default for RandomCondition {
    fn default() -> Self {
        Self { probability: 0.5 }
    }
}

impl ConditionEvaluator for RandomCondition {
    fn evaluate(&self, _expression: &str) -> bool {
        rand::rng().random_bool(self.probability)
    }
}

/// Always answers with the wrapped value. Useful for deterministic tests
/// and for hosts that resolve conditions ahead of time.
#[derive(Debug, Clone, Copy)]
pub struct FixedCondition(pub bool);

impl ConditionEvaluator for FixedCondition {
    fn evaluate(&self, _expression: &str) -> bool {
        self.0
    }
}
