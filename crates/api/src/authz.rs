//! Authorization at the command boundary, before anything is dispatched.

use sitecart_auth::{
    AuthzError, CommandAuthorization, Permission, Principal, TenantMembership, authorize,
};
use sitecart_fulfillment::EmployeeRef;

use crate::context::{PrincipalContext, TenantContext};

/// Check that the caller holds every permission `command` requires.
pub fn authorize_command<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = Principal {
        principal_id: principal.principal_id(),
        active_tenant_id: tenant.tenant_id(),
        membership: TenantMembership::from_roles(tenant.tenant_id(), principal.roles().to_vec()),
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Permission-only check for reads.
pub fn require(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    permission: Permission,
) -> Result<(), AuthzError> {
    authorize_command(tenant, principal, &Required(vec![permission]))
}

struct Required(Vec<Permission>);

impl CommandAuthorization for Required {
    fn required_permissions(&self) -> &[Permission] {
        &self.0
    }
}

/// Who a stage operation is attributed to.
///
/// A staff token pins the actor: the request may repeat its employee id but
/// not name someone else. Service tokens without an employee must say who is
/// acting in the request body.
pub fn resolve_actor(
    principal: &PrincipalContext,
    employee_id: Option<&str>,
    employee_name: Option<&str>,
) -> Result<Option<EmployeeRef>, AuthzError> {
    let requested = employee_id.map(str::trim).filter(|s| !s.is_empty());

    match (principal.employee(), requested) {
        (Some(token_emp), Some(id)) if token_emp.employee_id != id => {
            Err(AuthzError::Impersonation(id.to_string()))
        }
        (Some(token_emp), _) => Ok(Some(token_emp.clone())),
        (None, Some(id)) => {
            let name = employee_name
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(id);
            Ok(Some(EmployeeRef::new(id, name)))
        }
        (None, None) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecart_auth::{PrincipalId, Role, permissions};
    use sitecart_core::TenantId;

    fn principal(roles: Vec<Role>, employee: Option<EmployeeRef>) -> PrincipalContext {
        PrincipalContext::new(PrincipalId::new(), roles, employee)
    }

    #[test]
    fn roles_map_to_stage_permissions() {
        let tenant = TenantContext::new(TenantId::new());
        let packer = principal(vec![Role::PACKER], None);

        assert!(require(&tenant, &packer, permissions::PACKING_WRITE).is_ok());
        assert!(matches!(
            require(&tenant, &packer, permissions::DISPATCH_WRITE),
            Err(AuthzError::Forbidden(_))
        ));

        let admin = principal(vec![Role::ADMIN], None);
        assert!(require(&tenant, &admin, permissions::DRIVER_WRITE).is_ok());
    }

    #[test]
    fn staff_tokens_cannot_act_for_others() {
        let me = EmployeeRef::new("DRV-001", "Driver One");
        let p = principal(vec![Role::DRIVER], Some(me.clone()));

        assert_eq!(resolve_actor(&p, None, None), Ok(Some(me.clone())));
        assert_eq!(resolve_actor(&p, Some("DRV-001"), Some("x")), Ok(Some(me)));
        assert_eq!(
            resolve_actor(&p, Some("DRV-002"), None),
            Err(AuthzError::Impersonation("DRV-002".to_string()))
        );
    }

    #[test]
    fn service_tokens_name_the_actor() {
        let p = principal(vec![Role::ADMIN], None);
        assert_eq!(
            resolve_actor(&p, Some("EMP-P01"), None),
            Ok(Some(EmployeeRef::new("EMP-P01", "EMP-P01")))
        );
        assert_eq!(resolve_actor(&p, Some("  "), None), Ok(None));
    }
}
