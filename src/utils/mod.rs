pub mod db_utils;
pub mod teacher_locks;
