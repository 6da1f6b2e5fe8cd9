/// Authorization predicates for boards, tasks and comments
///
/// Every rule here is a plain function over plain data: callers load the
/// relations they need (see `Board::load_access` / `Task::load_access`) and
/// ask a question. Nothing in this module touches the database.
///
/// # Permission Model
///
/// 1. **Board owner**: full control, including deleting the board
/// 2. **Board member**: read/write on the board and all of its tasks
/// 3. **Task creator**: may delete the task they created
/// 4. **Comment author**: may edit or delete their own comment
///
/// Ownership and membership are independent relations. The owner does not
/// have to appear in the member list; the two checks are always OR'd.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::authorization::{has_board_access, BoardAccess};
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let board = BoardAccess { board_id: Uuid::new_v4(), owner_id: owner, member_ids: vec![] };
///
/// assert!(has_board_access(owner, &board));
/// assert!(!has_board_access(Uuid::new_v4(), &board));
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned by the `require_*` helpers when a predicate is false
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Requester is neither owner nor member of the board
    #[error("No access to board {0}")]
    NoBoardAccess(Uuid),

    /// Action is reserved for the board owner
    #[error("Only the owner of board {0} can do this")]
    NotBoardOwner(Uuid),

    /// Task deletion requires being its creator or the board owner
    #[error("Only the creator or the board owner can delete task {0}")]
    CannotDeleteTask(Uuid),

    /// Comment changes are reserved for the author
    #[error("Only the author can modify comment {0}")]
    NotCommentAuthor(Uuid),
}

/// Ownership and membership of a single board, as of the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardAccess {
    pub board_id: Uuid,
    pub owner_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

/// Access-relevant relations of a task, including its board's current
/// owner and members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAccess {
    pub task_id: Uuid,
    pub created_by: Option<Uuid>,
    pub board: BoardAccess,
}

/// Authorship of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentAccess {
    pub comment_id: Uuid,
    pub author_id: Uuid,
}

pub fn is_board_owner(user_id: Uuid, board: &BoardAccess) -> bool {
    board.owner_id == user_id
}

/// Membership only; the owner is not implicitly a member
pub fn is_board_member(user_id: Uuid, board: &BoardAccess) -> bool {
    board.member_ids.contains(&user_id)
}

pub fn has_board_access(user_id: Uuid, board: &BoardAccess) -> bool {
    is_board_owner(user_id, board) || is_board_member(user_id, board)
}

pub fn can_delete_board(user_id: Uuid, board: &BoardAccess) -> bool {
    is_board_owner(user_id, board)
}

/// Reading and writing a task share one gate
pub fn can_read_or_write_task(user_id: Uuid, task: &TaskAccess) -> bool {
    has_board_access(user_id, &task.board)
}

/// Creator or board owner; other members can't delete
pub fn can_delete_task(user_id: Uuid, task: &TaskAccess) -> bool {
    task.created_by == Some(user_id) || is_board_owner(user_id, &task.board)
}

pub fn can_write_comment(user_id: Uuid, comment: &CommentAccess) -> bool {
    comment.author_id == user_id
}

/// Comment access for the task named in the request path
///
/// `None` means the task didn't resolve; access is denied rather than
/// treated as an error.
pub fn can_access_task_comments(user_id: Uuid, task: Option<&TaskAccess>) -> bool {
    task.is_some_and(|task| has_board_access(user_id, &task.board))
}

pub fn require_board_access(user_id: Uuid, board: &BoardAccess) -> Result<(), AuthzError> {
    if !has_board_access(user_id, board) {
        return Err(AuthzError::NoBoardAccess(board.board_id));
    }

    Ok(())
}

pub fn require_board_owner(user_id: Uuid, board: &BoardAccess) -> Result<(), AuthzError> {
    if !can_delete_board(user_id, board) {
        return Err(AuthzError::NotBoardOwner(board.board_id));
    }

    Ok(())
}

pub fn require_task_access(user_id: Uuid, task: &TaskAccess) -> Result<(), AuthzError> {
    if !can_read_or_write_task(user_id, task) {
        return Err(AuthzError::NoBoardAccess(task.board.board_id));
    }

    Ok(())
}

pub fn require_task_delete(user_id: Uuid, task: &TaskAccess) -> Result<(), AuthzError> {
    if !can_delete_task(user_id, task) {
        return Err(AuthzError::CannotDeleteTask(task.task_id));
    }

    Ok(())
}

pub fn require_comment_author(user_id: Uuid, comment: &CommentAccess) -> Result<(), AuthzError> {
    if !can_write_comment(user_id, comment) {
        return Err(AuthzError::NotCommentAuthor(comment.comment_id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        owner: Uuid,
        member: Uuid,
        stranger: Uuid,
        board: BoardAccess,
    }

    fn fixture() -> Fixture {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();

        Fixture {
            owner,
            member,
            stranger: Uuid::new_v4(),
            board: BoardAccess {
                board_id: Uuid::new_v4(),
                owner_id: owner,
                member_ids: vec![member],
            },
        }
    }

    fn task_on(board: &BoardAccess, created_by: Option<Uuid>) -> TaskAccess {
        TaskAccess {
            task_id: Uuid::new_v4(),
            created_by,
            board: board.clone(),
        }
    }

    #[test]
    fn test_owner_has_access_without_membership() {
        let f = fixture();
        assert!(!is_board_member(f.owner, &f.board));
        assert!(is_board_owner(f.owner, &f.board));
        assert!(has_board_access(f.owner, &f.board));
    }

    #[test]
    fn test_owner_listed_as_member() {
        let mut f = fixture();
        f.board.member_ids.push(f.owner);
        assert!(is_board_member(f.owner, &f.board));
        assert!(has_board_access(f.owner, &f.board));
    }

    #[test]
    fn test_member_and_stranger_access() {
        let f = fixture();
        assert!(has_board_access(f.member, &f.board));
        assert!(!is_board_owner(f.member, &f.board));
        assert!(!has_board_access(f.stranger, &f.board));
    }

    #[test]
    fn test_only_owner_deletes_board() {
        let f = fixture();
        assert!(can_delete_board(f.owner, &f.board));
        assert!(!can_delete_board(f.member, &f.board));
        assert!(!can_delete_board(f.stranger, &f.board));

        assert_eq!(
            require_board_owner(f.member, &f.board),
            Err(AuthzError::NotBoardOwner(f.board.board_id))
        );
    }

    #[test]
    fn test_task_read_write_follows_board() {
        let f = fixture();
        let task = task_on(&f.board, Some(f.member));

        assert!(can_read_or_write_task(f.owner, &task));
        assert!(can_read_or_write_task(f.member, &task));
        assert!(!can_read_or_write_task(f.stranger, &task));
        assert!(require_task_access(f.stranger, &task).is_err());
    }

    #[test]
    fn test_task_access_reflects_current_membership() {
        let f = fixture();
        let mut task = task_on(&f.board, Some(f.member));
        assert!(can_read_or_write_task(f.member, &task));

        task.board.member_ids.clear();
        assert!(!can_read_or_write_task(f.member, &task));
    }

    #[test]
    fn test_task_delete_creator_or_owner() {
        let f = fixture();
        let other_member = Uuid::new_v4();
        let mut board = f.board.clone();
        board.member_ids.push(other_member);

        let task = task_on(&board, Some(f.member));
        assert!(can_delete_task(f.member, &task));
        assert!(can_delete_task(f.owner, &task));
        assert!(!can_delete_task(other_member, &task));
        assert!(!can_delete_task(f.stranger, &task));
        assert_eq!(
            require_task_delete(other_member, &task),
            Err(AuthzError::CannotDeleteTask(task.task_id))
        );
    }

    #[test]
    fn test_orphaned_task_delete_falls_back_to_owner() {
        let f = fixture();
        let task = task_on(&f.board, None);
        assert!(can_delete_task(f.owner, &task));
        assert!(!can_delete_task(f.member, &task));
    }

    #[test]
    fn test_comment_author_rule() {
        let author = Uuid::new_v4();
        let comment = CommentAccess {
            comment_id: Uuid::new_v4(),
            author_id: author,
        };

        assert!(can_write_comment(author, &comment));
        assert!(!can_write_comment(Uuid::new_v4(), &comment));
        assert!(require_comment_author(author, &comment).is_ok());
    }

    #[test]
    fn test_task_comments_fail_closed() {
        let f = fixture();
        let task = task_on(&f.board, None);

        assert!(can_access_task_comments(f.member, Some(&task)));
        assert!(can_access_task_comments(f.owner, Some(&task)));
        assert!(!can_access_task_comments(f.stranger, Some(&task)));
        assert!(!can_access_task_comments(f.owner, None));
    }

    #[test]
    fn test_authz_error_display() {
        let id = Uuid::new_v4();
        assert!(AuthzError::NoBoardAccess(id).to_string().contains("No access"));
        assert!(AuthzError::NotCommentAuthor(id).to_string().contains(&id.to_string()));
    }
}
