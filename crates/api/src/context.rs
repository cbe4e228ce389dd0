use sitecart_auth::{PrincipalId, Role};
use sitecart_core::TenantId;
use sitecart_fulfillment::EmployeeRef;

/// Tenant context for a request, taken from the token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Authenticated identity, roles and (for staff logins) the employee record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
    employee: Option<EmployeeRef>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>, employee: Option<EmployeeRef>) -> Self {
        Self {
            principal_id,
            roles,
            employee,
        }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn employee(&self) -> Option<&EmployeeRef> {
        self.employee.as_ref()
    }
}
