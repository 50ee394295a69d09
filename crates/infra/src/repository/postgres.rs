//! Postgres-backed company repository.
//!
//! Queries are runtime-checked (`bind`/`try_get`). Graph lookups are one
//! joined query; the join fan-out (departments × employees × offices × cars)
//! is deduplicated while assembling the aggregate. Mutations run inside an
//! explicit transaction; the unique-name constraint surfaces as
//! `RepositoryError::Conflict`.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use orgchart_companies::{
    Address, Car, Company, Department, Employee, NewAddress, NewCar, NewCompany, NewDepartment,
    NewEmployee, NewOffice, Office,
};
use orgchart_core::{AddressId, CarId, CompanyId, DepartmentId, EmployeeId, OfficeId};

use super::{CompanyRepository, Fetch, RepositoryError};

const GRAPH_SELECT: &str = r#"
SELECT
    c.id AS c_id, c.name AS c_name, c.created_at AS c_created_at, c.updated_at AS c_updated_at,
    d.id AS d_id, d.name AS d_name,
    e.id AS e_id, e.name AS e_name, e.title AS e_title,
    a.id AS a_id, a.street AS a_street, a.city AS a_city, a.country AS a_country,
    o.id AS o_id, o.location AS o_location,
    r.id AS r_id, r.plate AS r_plate, r.model AS r_model
FROM companies c
LEFT JOIN departments d ON d.company_id = c.id
LEFT JOIN employees e ON e.department_id = d.id
LEFT JOIN addresses a ON a.employee_id = e.id
LEFT JOIN offices o ON o.department_id = d.id
LEFT JOIN cars r ON r.company_id = c.id
"#;

/// Company store on a PostgreSQL pool (see `schema.sql` for the tables).
///
/// The pool is internally shared; cloning the repository is cheap.
#[derive(Debug, Clone)]
pub struct PostgresCompanyRepository {
    pool: PgPool,
}

impl PostgresCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_root(
        &self,
        clause: &str,
        bind: Bind<'_>,
    ) -> Result<Option<Company>, RepositoryError> {
        let sql = format!(
            "SELECT id, name, created_at, updated_at FROM companies WHERE {clause}"
        );
        let query = sqlx::query(&sql);
        let query = match bind {
            Bind::Id(id) => query.bind(id),
            Bind::Name(name) => query.bind(name),
        };
        let row = query.fetch_optional(&self.pool).await.map_err(db_err)?;
        row.map(|row| {
            Ok(Company {
                id: CompanyId::new(row.try_get("id").map_err(db_err)?),
                name: row.try_get("name").map_err(db_err)?,
                departments: Vec::new(),
                cars: Vec::new(),
                created_at: row.try_get("created_at").map_err(db_err)?,
                updated_at: row.try_get("updated_at").map_err(db_err)?,
            })
        })
        .transpose()
    }

    async fn find_graph(
        &self,
        clause: &str,
        bind: Bind<'_>,
    ) -> Result<Option<Company>, RepositoryError> {
        let sql = format!("{GRAPH_SELECT} WHERE {clause} ORDER BY d.id, e.id, o.id, r.id");
        let query = sqlx::query(&sql);
        let query = match bind {
            Bind::Id(id) => query.bind(id),
            Bind::Name(name) => query.bind(name),
        };
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        assemble_graph(&rows)
    }
}

enum Bind<'a> {
    Id(i64),
    Name(&'a str),
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    async fn find(&self, id: CompanyId, fetch: Fetch) -> Result<Option<Company>, RepositoryError> {
        match fetch {
            Fetch::Shallow => self.find_root("id = $1", Bind::Id(id.value())).await,
            Fetch::Graph => self.find_graph("c.id = $1", Bind::Id(id.value())).await,
        }
    }

    async fn find_by_name(
        &self,
        name: &str,
        fetch: Fetch,
    ) -> Result<Option<Company>, RepositoryError> {
        match fetch {
            Fetch::Shallow => self.find_root("name = $1", Bind::Name(name)).await,
            Fetch::Graph => self.find_graph("c.name = $1", Bind::Name(name)).await,
        }
    }

    async fn find_all(&self) -> Result<Vec<Company>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM companies ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                Ok(Company {
                    id: CompanyId::new(row.try_get("id").map_err(db_err)?),
                    name: row.try_get("name").map_err(db_err)?,
                    departments: Vec::new(),
                    cars: Vec::new(),
                    created_at: row.try_get("created_at").map_err(db_err)?,
                    updated_at: row.try_get("updated_at").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn create(&self, draft: NewCompany) -> Result<Company, RepositoryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query(
            "INSERT INTO companies (name, created_at, updated_at) VALUES ($1, $2, $2) RETURNING id",
        )
        .bind(&draft.name)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_err)?;
        let company_id: i64 = row.try_get("id").map_err(db_err)?;

        let (departments, cars) =
            insert_graph(&mut tx, company_id, draft.departments, draft.cars).await?;

        tx.commit().await.map_err(db_err)?;
        tracing::debug!(company_id, "company created");

        Ok(Company {
            id: CompanyId::new(company_id),
            name: draft.name,
            departments,
            cars,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, company: Company) -> Result<Company, RepositoryError> {
        let now = Utc::now();
        let company_id = company.id.value();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = sqlx::query(
            "UPDATE companies SET name = $2, updated_at = $3 WHERE id = $1 RETURNING created_at",
        )
        .bind(company_id)
        .bind(&company.name)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(write_err)?;

        let created_at: DateTime<Utc> = match updated {
            Some(row) => row.try_get("created_at").map_err(db_err)?,
            // Merge of an identity the store has never seen persists it.
            None => {
                sqlx::query(
                    "INSERT INTO companies (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
                )
                .bind(company_id)
                .bind(&company.name)
                .bind(company.created_at)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
                company.created_at
            }
        };

        // Reconcile the owned graph wholesale: the detached collections are
        // the source of truth after a merge.
        sqlx::query("DELETE FROM departments WHERE company_id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query("DELETE FROM cars WHERE company_id = $1")
            .bind(company_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let department_drafts = company.departments.iter().map(department_draft).collect();
        let car_drafts = company.cars.iter().map(car_draft).collect();
        let (departments, cars) =
            insert_graph(&mut tx, company_id, department_drafts, car_drafts).await?;

        tx.commit().await.map_err(db_err)?;

        Ok(Company {
            id: company.id,
            name: company.name,
            departments,
            cars,
            created_at,
            updated_at: now,
        })
    }

    async fn delete_by_id(&self, id: CompanyId) -> Result<(), RepositoryError> {
        // ON DELETE CASCADE removes the owned graph; a missing id is a no-op.
        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, company: Company) -> Result<(), RepositoryError> {
        self.delete_by_id(company.id).await
    }
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::storage(e.to_string())
}

fn write_err(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return RepositoryError::conflict(db.message().to_string());
        }
    }
    db_err(e)
}

fn department_draft(department: &Department) -> NewDepartment {
    NewDepartment {
        name: department.name.clone(),
        employees: department
            .employees
            .iter()
            .map(|e| NewEmployee {
                name: e.name.clone(),
                title: e.title.clone(),
                address: e.address.as_ref().map(|a| NewAddress {
                    street: a.street.clone(),
                    city: a.city.clone(),
                    country: a.country.clone(),
                }),
            })
            .collect(),
        offices: department
            .offices
            .iter()
            .map(|o| NewOffice {
                location: o.location.clone(),
            })
            .collect(),
    }
}

fn car_draft(car: &Car) -> NewCar {
    NewCar {
        plate: car.plate.clone(),
        model: car.model.clone(),
    }
}

async fn insert_graph(
    tx: &mut Transaction<'_, Postgres>,
    company_id: i64,
    departments: Vec<NewDepartment>,
    cars: Vec<NewCar>,
) -> Result<(Vec<Department>, Vec<Car>), RepositoryError> {
    let mut stored_departments = Vec::with_capacity(departments.len());
    for department in departments {
        let row = sqlx::query(
            "INSERT INTO departments (company_id, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(company_id)
        .bind(&department.name)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err)?;
        let department_id: i64 = row.try_get("id").map_err(db_err)?;

        let mut stored_employees = Vec::with_capacity(department.employees.len());
        for employee in department.employees {
            let row = sqlx::query(
                "INSERT INTO employees (department_id, name, title) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(department_id)
            .bind(&employee.name)
            .bind(&employee.title)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_err)?;
            let employee_id: i64 = row.try_get("id").map_err(db_err)?;

            let address = match employee.address {
                Some(address) => {
                    let row = sqlx::query(
                        "INSERT INTO addresses (employee_id, street, city, country) VALUES ($1, $2, $3, $4) RETURNING id",
                    )
                    .bind(employee_id)
                    .bind(&address.street)
                    .bind(&address.city)
                    .bind(&address.country)
                    .fetch_one(&mut **tx)
                    .await
                    .map_err(db_err)?;
                    Some(Address {
                        id: AddressId::new(row.try_get("id").map_err(db_err)?),
                        street: address.street,
                        city: address.city,
                        country: address.country,
                    })
                }
                None => None,
            };

            stored_employees.push(Employee {
                id: EmployeeId::new(employee_id),
                name: employee.name,
                title: employee.title,
                address,
            });
        }

        let mut stored_offices = Vec::with_capacity(department.offices.len());
        for office in department.offices {
            let row = sqlx::query(
                "INSERT INTO offices (department_id, location) VALUES ($1, $2) RETURNING id",
            )
            .bind(department_id)
            .bind(&office.location)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_err)?;
            stored_offices.push(Office {
                id: OfficeId::new(row.try_get("id").map_err(db_err)?),
                location: office.location,
            });
        }

        stored_departments.push(Department {
            id: DepartmentId::new(department_id),
            name: department.name,
            employees: stored_employees,
            offices: stored_offices,
        });
    }

    let mut stored_cars = Vec::with_capacity(cars.len());
    for car in cars {
        let row = sqlx::query(
            "INSERT INTO cars (company_id, plate, model) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(company_id)
        .bind(&car.plate)
        .bind(&car.model)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err)?;
        stored_cars.push(Car {
            id: CarId::new(row.try_get("id").map_err(db_err)?),
            plate: car.plate,
            model: car.model,
        });
    }

    Ok((stored_departments, stored_cars))
}

/// Assemble one aggregate from joined rows, deduplicating across the fan-out.
fn assemble_graph(rows: &[PgRow]) -> Result<Option<Company>, RepositoryError> {
    let first = match rows.first() {
        Some(row) => row,
        None => return Ok(None),
    };

    let mut company = Company {
        id: CompanyId::new(first.try_get("c_id").map_err(db_err)?),
        name: first.try_get("c_name").map_err(db_err)?,
        departments: Vec::new(),
        cars: Vec::new(),
        created_at: first.try_get("c_created_at").map_err(db_err)?,
        updated_at: first.try_get("c_updated_at").map_err(db_err)?,
    };

    let mut departments: BTreeMap<i64, Department> = BTreeMap::new();
    let mut cars: BTreeMap<i64, Car> = BTreeMap::new();
    let mut seen_employees: HashSet<i64> = HashSet::new();
    let mut seen_offices: HashSet<i64> = HashSet::new();

    for row in rows {
        let department_id: Option<i64> = row.try_get("d_id").map_err(db_err)?;
        if let Some(department_id) = department_id {
            let department = departments.entry(department_id).or_insert_with(|| Department {
                id: DepartmentId::new(department_id),
                name: row.try_get("d_name").unwrap_or_default(),
                employees: Vec::new(),
                offices: Vec::new(),
            });

            let employee_id: Option<i64> = row.try_get("e_id").map_err(db_err)?;
            if let Some(employee_id) = employee_id {
                if seen_employees.insert(employee_id) {
                    let address_id: Option<i64> = row.try_get("a_id").map_err(db_err)?;
                    let address = match address_id {
                        Some(address_id) => Some(Address {
                            id: AddressId::new(address_id),
                            street: row.try_get("a_street").map_err(db_err)?,
                            city: row.try_get("a_city").map_err(db_err)?,
                            country: row.try_get("a_country").map_err(db_err)?,
                        }),
                        None => None,
                    };
                    department.employees.push(Employee {
                        id: EmployeeId::new(employee_id),
                        name: row.try_get("e_name").map_err(db_err)?,
                        title: row.try_get("e_title").map_err(db_err)?,
                        address,
                    });
                }
            }

            let office_id: Option<i64> = row.try_get("o_id").map_err(db_err)?;
            if let Some(office_id) = office_id {
                if seen_offices.insert(office_id) {
                    department.offices.push(Office {
                        id: OfficeId::new(office_id),
                        location: row.try_get("o_location").map_err(db_err)?,
                    });
                }
            }
        }

        let car_id: Option<i64> = row.try_get("r_id").map_err(db_err)?;
        if let Some(car_id) = car_id {
            cars.entry(car_id).or_insert(Car {
                id: CarId::new(car_id),
                plate: row.try_get("r_plate").map_err(db_err)?,
                model: row.try_get("r_model").map_err(db_err)?,
            });
        }
    }

    company.departments = departments.into_values().collect();
    company.cars = cars.into_values().collect();
    Ok(Some(company))
}
