//! Built-in course outline
//!
//! New accounts and courses created with the default title start from this
//! Differential Equations outline instead of a generated one.

/// Title of the built-in course
pub const DEFAULT_COURSE_TITLE: &str = "Differential Equations";

/// Description of the built-in course
pub const DEFAULT_COURSE_DESCRIPTION: &str = "Advanced Mathematics • University Level";

/// One unit of a course outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitOutline {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// Units of the built-in Differential Equations course, in teaching order
pub const DEFAULT_UNITS: [UnitOutline; 8] = [
    UnitOutline {
        title: "First-Order Differential Equations",
        description: "Basic techniques for solving first-order equations",
        icon: "fas fa-book-open",
    },
    UnitOutline {
        title: "Second-Order Linear Equations",
        description: "Homogeneous and non-homogeneous second-order equations",
        icon: "fas fa-calculator",
    },
    UnitOutline {
        title: "Laplace Transforms",
        description: "Transform methods for solving differential equations",
        icon: "fas fa-chart-line",
    },
    UnitOutline {
        title: "Systems of Differential Equations",
        description: "Matrix methods and phase plane analysis",
        icon: "fas fa-network-wired",
    },
    UnitOutline {
        title: "Series Solutions",
        description: "Power series and special functions",
        icon: "fas fa-infinity",
    },
    UnitOutline {
        title: "Boundary Value Problems",
        description: "Sturm-Liouville theory and eigenvalue problems",
        icon: "fas fa-border-all",
    },
    UnitOutline {
        title: "Partial Differential Equations",
        description: "Heat, wave, and Laplace equations",
        icon: "fas fa-wave-square",
    },
    UnitOutline {
        title: "Numerical Methods",
        description: "Computational approaches to differential equations",
        icon: "fas fa-laptop-code",
    },
];

/// Whether `title` names the built-in course (case and surrounding space ignored)
pub fn is_default_course(title: &str) -> bool {
    title.trim().eq_ignore_ascii_case(DEFAULT_COURSE_TITLE)
}
