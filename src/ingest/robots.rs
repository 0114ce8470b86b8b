// src/ingest/robots.rs
//! robots.txt evaluation. Fetch problems fail open: an unreachable, non-200
//! or empty robots.txt allows the URL.

use reqwest::Url;

use super::http::PoliteClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RobotsPolicy {
    #[default]
    Check,
    /// Source is known to block generic bots but serves its feed to browsers.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Allow(String),
    Disallow(String),
}

#[derive(Debug, Default, Clone)]
struct Group {
    agents: Vec<String>,
    rules: Vec<Rule>,
}

/// Parsed robots.txt.
#[derive(Debug, Default, Clone)]
pub struct Robots {
    groups: Vec<Group>,
}

impl Robots {
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current: Option<Group> = None;
        let mut last_was_agent = false;

        for raw in content.lines() {
            let line = raw.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().to_string();

            match key.as_str() {
                "user-agent" => {
                    if !last_was_agent {
                        if let Some(g) = current.take() {
                            groups.push(g);
                        }
                        current = Some(Group::default());
                    }
                    // An empty token would match every crawler.
                    if let Some(g) = current.as_mut().filter(|_| !value.is_empty()) {
                        g.agents.push(value.to_ascii_lowercase());
                    }
                    last_was_agent = true;
                }
                "allow" | "disallow" => {
                    last_was_agent = false;
                    let Some(g) = current.as_mut() else {
                        continue;
                    };
                    if key == "allow" {
                        g.rules.push(Rule::Allow(value));
                    } else if value.is_empty() {
                        // "Disallow:" with no path allows everything
                        g.rules.push(Rule::Allow(String::new()));
                    } else {
                        g.rules.push(Rule::Disallow(value));
                    }
                }
                _ => {
                    last_was_agent = false;
                }
            }
        }
        if let Some(g) = current.take() {
            groups.push(g);
        }
        Self { groups }
    }

    /// First matching rule wins; no match allows.
    pub fn can_fetch(&self, user_agent: &str, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return true;
        };
        let mut path = parsed.path().to_string();
        if let Some(q) = parsed.query() {
            path.push('?');
            path.push_str(q);
        }

        let ua = user_agent.to_ascii_lowercase();
        let specific = self.groups.iter().find(|g| {
            g.agents
                .iter()
                .filter(|a| a.as_str() != "*")
                .filter_map(|a| a.split('/').next().filter(|t| !t.is_empty()))
                .any(|token| ua.contains(token))
        });
        let group = specific.or_else(|| self.groups.iter().find(|g| g.agents.iter().any(|a| a == "*")));
        let Some(group) = group else {
            return true;
        };

        for rule in &group.rules {
            match rule {
                Rule::Allow(prefix) if path.starts_with(prefix.as_str()) => return true,
                Rule::Disallow(prefix) if path.starts_with(prefix.as_str()) => return false,
                _ => {}
            }
        }
        true
    }
}

fn robots_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();
    Some(format!("{}://{}{}/robots.txt", parsed.scheme(), host, port))
}

/// Whether `url` may be scraped under `policy`.
pub async fn is_allowed(client: &PoliteClient, policy: RobotsPolicy, url: &str) -> bool {
    if policy == RobotsPolicy::Skip {
        return true;
    }
    let Some(robots) = robots_url(url) else {
        return true;
    };
    let agent = PoliteClient::random_user_agent();
    match client.get_if_ok(&robots).await {
        Ok(Some(body)) if !body.trim().is_empty() => {
            let allowed = Robots::parse(&body).can_fetch(agent, url);
            tracing::debug!(target: "ingest", %url, allowed, "robots.txt evaluated");
            allowed
        }
        Ok(_) => {
            tracing::warn!(target: "ingest", %robots, "robots.txt missing or empty, assuming allowed");
            true
        }
        Err(e) => {
            tracing::warn!(target: "ingest", %robots, error = ?e, "robots.txt fetch failed, assuming allowed");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko Firefox/114.0";

    #[test]
    fn wildcard_group_disallow_blocks_prefix() {
        let r = Robots::parse("User-agent: *\nDisallow: /private\n");
        assert!(!r.can_fetch(UA, "https://example.com/private/page"));
        assert!(r.can_fetch(UA, "https://example.com/public"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let r = Robots::parse("User-agent: *\nAllow: /news/rss\nDisallow: /news\n");
        assert!(r.can_fetch(UA, "https://example.com/news/rss"));
        assert!(!r.can_fetch(UA, "https://example.com/news/today"));
    }

    #[test]
    fn empty_disallow_allows_everything() {
        let r = Robots::parse("User-agent: *\nDisallow:\n");
        assert!(r.can_fetch(UA, "https://example.com/anything"));
    }

    #[test]
    fn specific_agent_group_takes_precedence() {
        let txt = "User-agent: firefox\nDisallow: /\n\nUser-agent: *\nDisallow:\n";
        let r = Robots::parse(txt);
        assert!(!r.can_fetch(UA, "https://example.com/"));
        assert!(r.can_fetch("SomeBot/1.0", "https://example.com/"));
    }

    #[test]
    fn empty_agent_line_matches_no_crawler() {
        let txt = "User-agent:\nDisallow: /\n\nUser-agent: *\nAllow: /\n";
        let r = Robots::parse(txt);
        assert!(r.can_fetch(UA, "https://example.com/news"));
        assert!(r.can_fetch("curl/8.0", "https://example.com/news"));
    }

    #[test]
    fn no_groups_allows() {
        let r = Robots::parse("# nothing here\nSitemap: https://example.com/sitemap.xml\n");
        assert!(r.can_fetch(UA, "https://example.com/x"));
    }

    #[test]
    fn robots_url_keeps_scheme_host_and_port() {
        assert_eq!(
            robots_url("http://localhost:8080/feed.xml").as_deref(),
            Some("http://localhost:8080/robots.txt")
        );
    }
}
