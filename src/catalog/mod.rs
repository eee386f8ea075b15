mod seed;

use crate::models::{Department, Executive, RevenueTarget, Task, TaskStatus};

const DEPARTMENTS: &[Department] = &[
    Department {
        slug: "sales",
        name: "영업본부",
    },
    Department {
        slug: "production",
        name: "생산본부",
    },
    Department {
        slug: "quality",
        name: "품질본부+연구소",
    },
];

/// Canonical executive, task and revenue definitions. Everything is held in
/// memory and every lookup is a linear scan.
#[derive(Debug, Clone)]
pub struct Catalog {
    executives: Vec<Executive>,
    tasks: Vec<Task>,
    company_revenue: RevenueTarget,
}

impl Catalog {
    pub fn new(executives: Vec<Executive>, tasks: Vec<Task>, company_revenue: RevenueTarget) -> Self {
        Self {
            executives,
            tasks,
            company_revenue,
        }
    }

    /// The dataset the dashboard ships with.
    pub fn sample() -> Self {
        Self::new(seed::executives(), seed::immediate_tasks(), seed::company_revenue())
    }

    pub fn executives(&self) -> &[Executive] {
        &self.executives
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn company_revenue(&self) -> &RevenueTarget {
        &self.company_revenue
    }

    pub fn executive_by_id(&self, id: &str) -> Option<&Executive> {
        self.executives.iter().find(|executive| executive.id == id)
    }

    pub fn executives_in_department(&self, department: &str) -> Vec<&Executive> {
        self.executives
            .iter()
            .filter(|executive| executive.department.as_deref() == Some(department))
            .collect()
    }

    pub fn tasks_by_department(&self, department: &str) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.department == department)
            .cloned()
            .collect()
    }

    pub fn tasks_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.status == status)
            .cloned()
            .collect()
    }

    pub fn total_kpi_count(&self) -> usize {
        self.executives.iter().map(|executive| executive.kpis.len()).sum()
    }
}

pub fn departments() -> &'static [Department] {
    DEPARTMENTS
}

pub fn department_by_slug(slug: &str) -> Option<Department> {
    DEPARTMENTS.iter().find(|department| department.slug == slug).copied()
}
