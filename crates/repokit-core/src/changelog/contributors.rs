//! Contributor extraction.

use super::types::{AuthorAssociation, Commit, Contributors};
use crate::util::sorted_case_insensitive;

/// Split the authors of `commits` into team and community members.
///
/// Logins listed in `team_members` count as team regardless of their
/// association. A login seen as team on any commit is never listed as
/// community.
#[must_use]
pub fn extract_contributors<'a, I>(commits: I, team_members: &[String]) -> Contributors
where
    I: IntoIterator<Item = &'a Commit>,
{
    let mut team = Vec::new();
    let mut community = Vec::new();

    for author in commits.into_iter().filter_map(|c| c.author.as_ref()) {
        let listed = team_members
            .iter()
            .any(|member| member.eq_ignore_ascii_case(&author.login));
        if listed || author.association == AuthorAssociation::Team {
            team.push(author.login.clone());
        } else {
            community.push(author.login.clone());
        }
    }

    let team = sorted_case_insensitive(team);
    let community: Vec<String> = sorted_case_insensitive(community)
        .into_iter()
        .filter(|login| !team.iter().any(|t| t.eq_ignore_ascii_case(login)))
        .collect();
    let all = sorted_case_insensitive(team.iter().chain(community.iter()).cloned());

    Contributors {
        team,
        community,
        all,
    }
}
