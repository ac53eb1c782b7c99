use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::types::{Employee, RecordId};

/// One employee in the reporting hierarchy together with their direct reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgNode {
    pub id: RecordId,
    pub name: String,
    pub position: Option<String>,
    pub department_id: Option<RecordId>,
    pub reports: Vec<OrgNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrgTreeError {
    #[error("manager links form a cycle through employee {0}")]
    Cycle(RecordId),
    #[error("employee {0} not found")]
    UnknownEmployee(RecordId),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Manager→report index over a snapshot of employees.
///
/// Reports keep the order of the input slice.
pub struct OrgChart<'a> {
    employees: &'a [Employee],
    index: HashMap<RecordId, usize>,
    reports: HashMap<RecordId, Vec<usize>>,
}

impl<'a> OrgChart<'a> {
    pub fn new(employees: &'a [Employee]) -> Self {
        let mut index = HashMap::with_capacity(employees.len());
        let mut reports: HashMap<RecordId, Vec<usize>> = HashMap::new();
        for (position, employee) in employees.iter().enumerate() {
            index.insert(employee.id, position);
            if let Some(manager_id) = employee.manager_id {
                reports.entry(manager_id).or_default().push(position);
            }
        }
        Self {
            employees,
            index,
            reports,
        }
    }

    /// Walks every manager chain once and fails on the first cycle found.
    pub fn check_acyclic(&self) -> Result<(), OrgTreeError> {
        let mut marks = vec![Mark::Unvisited; self.employees.len()];
        let mut path = Vec::new();

        for start in 0..self.employees.len() {
            let mut cursor = Some(start);
            while let Some(position) = cursor {
                match marks[position] {
                    Mark::Done => break,
                    Mark::InProgress => {
                        return Err(OrgTreeError::Cycle(self.employees[position].id));
                    }
                    Mark::Unvisited => {
                        marks[position] = Mark::InProgress;
                        path.push(position);
                        cursor = self.employees[position]
                            .manager_id
                            .and_then(|manager_id| self.index.get(&manager_id).copied());
                    }
                }
            }
            for position in path.drain(..) {
                marks[position] = Mark::Done;
            }
        }
        Ok(())
    }

    /// Builds the full forest rooted at employees without a manager.
    pub fn forest(&self) -> Result<Vec<OrgNode>, OrgTreeError> {
        self.check_acyclic()?;
        let mut visited = HashSet::new();
        self.employees
            .iter()
            .enumerate()
            .filter(|(_, employee)| employee.manager_id.is_none())
            .map(|(position, _)| self.build_node(position, &mut visited))
            .collect()
    }

    /// Builds the tree below a single employee.
    pub fn subtree(&self, root: RecordId) -> Result<OrgNode, OrgTreeError> {
        let position = *self
            .index
            .get(&root)
            .ok_or(OrgTreeError::UnknownEmployee(root))?;
        self.check_acyclic()?;
        self.build_node(position, &mut HashSet::new())
    }

    /// Returns `true` when making `manager_id` the manager of `employee_id`
    /// would close a loop in the reporting chain.
    pub fn would_create_cycle(&self, employee_id: RecordId, manager_id: RecordId) -> bool {
        if employee_id == manager_id {
            return true;
        }
        let mut cursor = Some(manager_id);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == employee_id {
                return true;
            }
            // Existing corrupt chains must not spin forever.
            steps += 1;
            if steps > self.employees.len() {
                return true;
            }
            cursor = self
                .index
                .get(&current)
                .and_then(|&position| self.employees[position].manager_id);
        }
        false
    }

    fn build_node(
        &self,
        position: usize,
        visited: &mut HashSet<RecordId>,
    ) -> Result<OrgNode, OrgTreeError> {
        let employee = &self.employees[position];
        if !visited.insert(employee.id) {
            return Err(OrgTreeError::Cycle(employee.id));
        }

        let reports = match self.reports.get(&employee.id) {
            Some(children) => children
                .iter()
                .map(|&child| self.build_node(child, visited))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(OrgNode {
            id: employee.id,
            name: employee.full_name(),
            position: employee.position.clone(),
            department_id: employee.department_id,
            reports,
        })
    }
}
