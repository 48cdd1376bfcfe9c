use crate::domain::UserId;

/// Whether `user_id` may run operator commands (`/broadcast`, `/edit`).
///
/// An empty allow-list leaves the commands open to everyone.
pub fn is_operator(user_id: Option<UserId>, operators: &[i64]) -> bool {
    if operators.is_empty() {
        return true;
    }
    let Some(user_id) = user_id else {
        return false;
    };
    operators.contains(&user_id.0)
}
