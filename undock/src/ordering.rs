use std::collections::{HashMap, VecDeque};
use std::future::Future;

use undock_types::project::{Project, ProjectName, Service, ServiceName};

use crate::error::TearDownError;

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("Dependency graph of project <{project}> contains a cycle involving: {}", .services.iter().map(|service| service.to_string()).collect::<Vec<_>>().join(", "))]
pub struct DependencyCycle {
    pub project: ProjectName,
    pub services: Vec<ServiceName>,
}

/// Orders services so that every service comes before all of its dependencies,
/// i.e. a service shows up only after everything depending on it.
///
/// Dependency references that do not resolve to a declared service are ignored.
/// Ties keep declaration order.
pub fn reverse_dependency_order(project: &Project) -> Result<Vec<&Service>, DependencyCycle> {
    let declared: HashMap<&ServiceName, &Service> = project.services.iter()
        .map(|service| (&service.name, service))
        .collect();

    // In-degree counts dependents, so zero in-degree means nothing depends
    // on the service anymore and it is safe to process.
    let mut dependents: HashMap<&ServiceName, usize> = project.services.iter()
        .map(|service| (&service.name, 0))
        .collect();
    for service in &project.services {
        for dependency in &service.depends_on {
            if let Some(count) = dependents.get_mut(dependency) {
                *count += 1;
            }
        }
    }

    let mut queue: VecDeque<&Service> = project.services.iter()
        .filter(|service| dependents[&service.name] == 0)
        .collect();

    let mut order = Vec::with_capacity(project.services.len());
    while let Some(service) = queue.pop_front() {
        order.push(service);
        for dependency in &service.depends_on {
            if let Some(count) = dependents.get_mut(dependency) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(declared[dependency]);
                }
            }
        }
    }

    if order.len() < project.services.len() {
        let ordered: Vec<&ServiceName> = order.iter().map(|service| &service.name).collect();
        let services = project.services.iter()
            .map(|service| &service.name)
            .filter(|name| !ordered.contains(name))
            .cloned()
            .collect();
        return Err(DependencyCycle { project: Clone::clone(&project.name), services });
    }

    Ok(order)
}

/// Invokes `action` once per declared service, in reverse dependency order,
/// threading `state` from call to call.
///
/// Strictly sequential across services; a failing action stops the walk and
/// its error is propagated. On a cyclic graph no action is invoked at all.
pub async fn in_reverse_dependency_order<S, F, Fut>(project: &Project, state: S, mut action: F) -> Result<S, TearDownError>
where
    F: FnMut(S, Service) -> Fut,
    Fut: Future<Output = Result<S, TearDownError>>,
{
    let order = reverse_dependency_order(project)?;
    let mut state = state;
    for service in order {
        state = action(state, Clone::clone(service)).await?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn service(name: &str, depends_on: &[&str]) -> Service {
        Service {
            name: ServiceName::try_from(name).unwrap(),
            depends_on: depends_on.iter().map(|name| ServiceName::try_from(*name).unwrap()).collect(),
        }
    }

    fn project(services: Vec<Service>) -> Project {
        Project {
            name: ProjectName::try_from("shop").unwrap(),
            services,
        }
    }

    fn names(order: &[&Service]) -> Vec<String> {
        order.iter().map(|service| service.name.to_string()).collect()
    }

    #[test]
    fn should_order_a_dependent_before_its_dependency() -> Result<()> {
        let project = project(vec![
            service("db", &[]),
            service("web", &["db"]),
        ]);

        let order = reverse_dependency_order(&project).unwrap();

        verify_that!(names(&order), eq(vec![String::from("web"), String::from("db")]))
    }

    #[test]
    fn should_order_a_diamond_with_the_root_first_and_the_shared_dependency_last() -> Result<()> {
        let project = project(vec![
            service("store", &[]),
            service("api", &["store"]),
            service("worker", &["store"]),
            service("gateway", &["api", "worker"]),
        ]);

        let order = reverse_dependency_order(&project).unwrap();
        let order = names(&order);

        verify_that!(order.first(), some(eq(&String::from("gateway"))))?;
        verify_that!(order.last(), some(eq(&String::from("store"))))
    }

    #[test]
    fn should_ignore_dependency_references_to_undeclared_services() -> Result<()> {
        let project = project(vec![
            service("web", &["db", "legacy-service"]),
            service("db", &[]),
        ]);

        let order = reverse_dependency_order(&project).unwrap();

        verify_that!(names(&order), eq(vec![String::from("web"), String::from("db")]))
    }

    #[test]
    fn should_report_a_cycle() -> Result<()> {
        let project = project(vec![
            service("a", &["b"]),
            service("b", &["a"]),
        ]);

        verify_that!(reverse_dependency_order(&project), err(anything()))
    }

    #[tokio::test]
    async fn should_invoke_no_action_for_a_cyclic_graph() -> Result<()> {
        let project = project(vec![
            service("a", &["b"]),
            service("b", &["a"]),
        ]);

        let result = in_reverse_dependency_order(&project, 0_usize, |invocations, _service| async move {
            Ok(invocations + 1)
        }).await;

        verify_that!(result, err(anything()))
    }

    #[tokio::test]
    async fn should_thread_state_through_all_actions() -> Result<()> {
        let project = project(vec![
            service("db", &[]),
            service("web", &["db"]),
        ]);

        let visited = in_reverse_dependency_order(&project, Vec::new(), |mut visited, service| async move {
            visited.push(service.name.to_string());
            Ok(visited)
        }).await.unwrap();

        verify_that!(visited, eq(vec![String::from("web"), String::from("db")]))
    }
}
