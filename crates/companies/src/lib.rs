//! `orgchart-companies` — the company structure entity model.
//!
//! One aggregate: `Company` owns its departments and cars; a department owns
//! its employees and offices; an employee has at most one address. Ownership
//! is exclusive throughout, so the aggregate is created, merged, and removed
//! as a whole.

pub mod company;
pub mod department;
pub mod employee;

pub use company::{Car, Company, NewCar, NewCompany};
pub use department::{Department, NewDepartment, NewOffice, Office};
pub use employee::{Address, Employee, NewAddress, NewEmployee};
