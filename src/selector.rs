//! Groups scanned sessions by project and keeps the most recent few.

use crate::sessions::{ProjectGroup, Session};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Newest first; equal mtimes fall back to the session id.
fn by_recency(a: &Session, b: &Session) -> Ordering {
    b.last_modified
        .cmp(&a.last_modified)
        .then_with(|| a.id.cmp(&b.id))
}

/// Group `sessions` by project, keeping at most `max_per_project` of the
/// most recently modified sessions in each.
///
/// Projects come out ordered by their newest session (descending), then by
/// project id. Projects without sessions never appear.
pub fn group_and_select(
    sessions: impl IntoIterator<Item = Session>,
    max_per_project: usize,
) -> Vec<ProjectGroup> {
    let mut by_project: BTreeMap<String, Vec<Session>> = BTreeMap::new();
    for session in sessions {
        by_project.entry(session.project.clone()).or_default().push(session);
    }

    let mut groups: Vec<ProjectGroup> = by_project
        .into_iter()
        .map(|(project, mut sessions)| {
            sessions.sort_by(by_recency);
            sessions.truncate(max_per_project);
            ProjectGroup { project, sessions }
        })
        .filter(|g| !g.sessions.is_empty())
        .collect();

    groups.sort_by(|a, b| {
        b.latest_activity()
            .cmp(&a.latest_activity())
            .then_with(|| a.project.cmp(&b.project))
    });

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Local, TimeZone};
    use std::path::PathBuf;

    fn base() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).single().unwrap()
    }

    fn session(project: &str, id: &str, minutes: i64) -> Session {
        Session::new(
            id.to_string(),
            project.to_string(),
            PathBuf::from(format!("{}/{}.jsonl", project, id)),
            base() + Duration::minutes(minutes),
        )
    }

    fn layout(groups: &[ProjectGroup]) -> Vec<(String, Vec<String>)> {
        groups
            .iter()
            .map(|g| (g.project.clone(), g.sessions.iter().map(|s| s.id.clone()).collect()))
            .collect()
    }

    #[test]
    fn test_caps_and_orders_projects() {
        // A: T1 > T2 > T3 > T4, B: one session older than T1
        let sessions = vec![
            session("A", "t3", 20),
            session("B", "b1", 25),
            session("A", "t1", 40),
            session("A", "t4", 10),
            session("A", "t2", 30),
        ];

        let groups = group_and_select(sessions, 3);
        assert_eq!(
            layout(&groups),
            vec![
                ("A".to_string(), vec!["t1".to_string(), "t2".to_string(), "t3".to_string()]),
                ("B".to_string(), vec!["b1".to_string()]),
            ]
        );
    }

    #[test]
    fn test_equal_mtime_tie_break_is_stable() {
        let forward = vec![session("P", "c", 5), session("P", "a", 5), session("P", "b", 5)];
        let mut reversed = forward.clone();
        reversed.reverse();

        let one = layout(&group_and_select(forward, 3));
        let two = layout(&group_and_select(reversed, 3));
        assert_eq!(one, two);
        assert_eq!(one[0].1, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_project_tie_break_by_id() {
        let groups = group_and_select(vec![session("zeta", "1", 0), session("alpha", "2", 0)], 3);
        assert_eq!(groups[0].project, "alpha");
        assert_eq!(groups[1].project, "zeta");
    }

    #[test]
    fn test_no_project_exceeds_cap() {
        let sessions: Vec<Session> = (0..50)
            .map(|i| session(&format!("p{}", i % 4), &format!("s{:02}", i), i))
            .collect();
        for g in group_and_select(sessions, 3) {
            assert!(g.sessions.len() <= 3);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_and_select(Vec::new(), 3).is_empty());
    }
}
