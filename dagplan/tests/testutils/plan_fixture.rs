//! Logical plans over a small employee/dept/score catalog

use dagplan::{
    DataType, EvalNode, EvalType, ExecutionPlan, JoinType, LogicalNode, PlanContext,
    PlannerConfig, Schema, Target,
};

pub struct PlanFixture {
    pub ctx: PlanContext,
}

#[allow(dead_code)]
impl PlanFixture {
    pub fn new() -> Self {
        super::init_logging();
        Self {
            ctx: PlanContext::new(),
        }
    }

    pub fn with_config(config: PlannerConfig) -> Self {
        super::init_logging();
        Self {
            ctx: PlanContext::with_config(config),
        }
    }

    pub fn employee_schema() -> Schema {
        Schema::new()
            .with_column("name", DataType::Text)
            .with_column("empid", DataType::Int4)
            .with_column("deptname", DataType::Text)
    }

    pub fn dept_schema() -> Schema {
        Schema::new()
            .with_column("deptname", DataType::Text)
            .with_column("manager", DataType::Text)
    }

    pub fn score_schema() -> Schema {
        Schema::new()
            .with_column("deptname", DataType::Text)
            .with_column("score", DataType::Int8)
            .with_column("year", DataType::Int2)
    }

    pub fn employee(&self) -> LogicalNode {
        self.ctx.scan("employee", Self::employee_schema())
    }

    pub fn dept(&self) -> LogicalNode {
        self.ctx.scan("dept", Self::dept_schema())
    }

    pub fn score(&self) -> LogicalNode {
        self.ctx.scan("score", Self::score_schema())
    }

    /// `employee.deptname = dept.deptname`
    pub fn dept_predicate(&self) -> EvalNode {
        self.ctx
            .binary(
                EvalType::Equal,
                EvalNode::field("employee.deptname", DataType::Text),
                EvalNode::field("dept.deptname", DataType::Text),
            )
            .expect("comparison always types")
    }

    /// `SELECT name, manager FROM employee JOIN dept ON ...`
    pub fn employee_dept_join(&self) -> LogicalNode {
        let join = self.ctx.join(
            JoinType::Inner,
            Some(self.dept_predicate()),
            self.employee(),
            self.dept(),
        );
        self.ctx.projection(
            vec![
                Target::new(EvalNode::field("name", DataType::Text)),
                Target::new(EvalNode::field("manager", DataType::Text)),
            ],
            join,
        )
    }

    /// `SELECT deptname FROM dept UNION SELECT deptname FROM score`
    pub fn dept_score_union(&self) -> LogicalNode {
        let column = || vec![Target::new(EvalNode::field("deptname", DataType::Text))];
        let left = self.ctx.projection(column(), self.dept());
        let right = self.ctx.projection(column(), self.score());
        self.ctx.union(false, left, right)
    }

    /// `SELECT * FROM score WHERE year > 2000 LIMIT 10`
    pub fn recent_scores(&self) -> LogicalNode {
        let predicate = self
            .ctx
            .binary(
                EvalType::Gth,
                EvalNode::field("year", DataType::Int2),
                EvalNode::constant(2000i16),
            )
            .expect("comparison always types");
        self.ctx.limit(10, self.ctx.selection(predicate, self.score()))
    }

    pub fn built(&self, trees: Vec<LogicalNode>) -> ExecutionPlan {
        let mut plan = self.ctx.new_execution_plan();
        for tree in trees {
            plan.add_plan(tree);
        }
        plan.build().expect("fixture plans lower cleanly");
        plan
    }
}
