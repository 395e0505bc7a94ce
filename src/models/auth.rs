// src/models/auth.rs

use serde::{Deserialize, Serialize};

// Papéis emitidos pelo provedor de identidade (dentro do JWT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    Finance,
    Sales,
    Storekeeper,
    FieldRep,
    Staff,
}

impl Role {
    /// Papéis que enxergam registros de todos os usuários (e não só os próprios)
    pub fn sees_all_records(self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Finance)
    }
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (ID do usuário)
    pub name: String, // Nome de exibição, gravado nas trilhas de auditoria
    pub role: Role,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

// Quem está executando a ação. Sempre passado explicitamente para os serviços.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl From<Claims> for Actor {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            role: claims.role,
        }
    }
}
