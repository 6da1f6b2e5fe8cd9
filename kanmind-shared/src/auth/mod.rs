/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: bearer token issuance and validation
/// - [`middleware`]: request-level auth context and bearer extraction
/// - [`authorization`]: board/task/comment permission predicates
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::auth::jwt::{create_token, validate_token, Claims};
/// use kanmind_shared::auth::password::{hash_password, verify_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4()), "secret-key-with-at-least-32-bytes")?;
/// let claims = validate_token(&token, "secret-key-with-at-least-32-bytes")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
