//! Page composer: loads the data behind one screen together with the state
//! of the actions that screen offers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::AgentloomResult;
use crate::http::ApiClient;
use crate::models::{
    Agent, Approval, AuditEntry, AuditQuery, ConversationSummary, Document, Group, OrgNode,
    RoleDef, Tool, User,
};
use crate::permissions::{Affordance, PermissionGate, UiState, AFFORDANCES};

const RECENT_AGENTS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Dashboard,
    Agents,
    Tools,
    Knowledge,
    Documents { tool_id: String },
    Conversations { agent_id: String },
    Approvals,
    Users,
    Roles,
    Groups,
    OrgChart,
    Audit(AuditQuery),
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Agents => "Agents",
            Page::Tools => "Tools",
            Page::Knowledge => "Knowledge",
            Page::Documents { .. } => "Documents",
            Page::Conversations { .. } => "Conversations",
            Page::Approvals => "Approvals",
            Page::Users => "Users",
            Page::Roles => "Roles",
            Page::Groups => "Groups",
            Page::OrgChart => "Org chart",
            Page::Audit(_) => "Audit log",
        }
    }

    /// Permission without which the page is not offered at all.
    pub fn required_permission(&self) -> Option<&'static str> {
        match self {
            Page::Users => Some("security:users:manage"),
            Page::Roles | Page::Groups => Some("security:roles:manage"),
            Page::Audit(_) => Some("security:audit:read"),
            _ => None,
        }
    }

    fn affordance_ids(&self) -> &'static [&'static str] {
        match self {
            Page::Dashboard => &["agents.create", "tools.create"],
            Page::Agents => &[
                "agents.create",
                "agents.edit",
                "agents.delete",
                "agents.publish",
            ],
            Page::Tools => &["tools.create", "tools.delete"],
            Page::Knowledge | Page::Documents { .. } => &["knowledge.upload"],
            Page::Approvals => &["approvals.decide"],
            Page::Users => &["security.users"],
            Page::Roles | Page::Groups => &["security.roles"],
            Page::Audit(_) => &["security.audit"],
            Page::Conversations { .. } | Page::OrgChart => &[],
        }
    }

    fn affordances(&self) -> Vec<&'static Affordance> {
        let ids = self.affordance_ids();
        AFFORDANCES.iter().filter(|a| ids.contains(&a.id)).collect()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Documents { tool_id } => write!(f, "documents/{}", tool_id),
            Page::Conversations { agent_id } => write!(f, "conversations/{}", agent_id),
            Page::Users => f.write_str("security/users"),
            Page::Roles => f.write_str("security/roles"),
            Page::Groups => f.write_str("security/groups"),
            Page::OrgChart => f.write_str("security/org-chart"),
            Page::Audit(_) => f.write_str("security/audit"),
            other => f.write_str(&other.title().to_lowercase()),
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_matches('/').to_lowercase();
        let (head, rest) = match s.split_once('/') {
            Some((h, r)) => (h, Some(r)),
            None => (s.as_str(), None),
        };
        let page = match (head, rest) {
            ("dashboard" | "home", None) => Page::Dashboard,
            ("agents", None) => Page::Agents,
            ("tools", None) => Page::Tools,
            ("knowledge", None) => Page::Knowledge,
            ("documents" | "knowledge", Some(id)) if !id.is_empty() => Page::Documents {
                tool_id: id.to_string(),
            },
            ("conversations", Some(id)) if !id.is_empty() => Page::Conversations {
                agent_id: id.to_string(),
            },
            ("approvals", None) => Page::Approvals,
            ("security", Some("users")) | ("users", None) => Page::Users,
            ("security", Some("roles")) | ("roles", None) => Page::Roles,
            ("security", Some("groups")) | ("groups", None) => Page::Groups,
            ("security", Some("org-chart" | "org")) | ("org-chart", None) => Page::OrgChart,
            ("security", Some("audit")) | ("audit", None) => Page::Audit(AuditQuery::default()),
            ("conversations", _) => return Err("conversations needs an agent id".to_string()),
            _ => return Err(format!("Unknown page: {}", s)),
        };
        Ok(page)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
    pub agent_count: usize,
    pub published_agents: usize,
    pub tool_count: usize,
    /// `None` when the approvals endpoint was not readable.
    pub pending_approvals: Option<usize>,
    pub recent_agents: Vec<Agent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "page", content = "data", rename_all = "snake_case")]
pub enum PageData {
    Dashboard(DashboardSummary),
    Agents(Vec<Agent>),
    Tools(Vec<Tool>),
    Knowledge(Vec<Tool>),
    Documents(Vec<Document>),
    Conversations(Vec<ConversationSummary>),
    Approvals(Vec<Approval>),
    Users(Vec<User>),
    Roles(Vec<RoleDef>),
    Groups(Vec<Group>),
    OrgChart(Vec<OrgNode>),
    Audit(Vec<AuditEntry>),
}

impl PageData {
    pub fn len(&self) -> usize {
        match self {
            PageData::Dashboard(_) => 1,
            PageData::Agents(v) => v.len(),
            PageData::Tools(v) | PageData::Knowledge(v) => v.len(),
            PageData::Documents(v) => v.len(),
            PageData::Conversations(v) => v.len(),
            PageData::Approvals(v) => v.len(),
            PageData::Users(v) => v.len(),
            PageData::Roles(v) => v.len(),
            PageData::Groups(v) => v.len(),
            PageData::OrgChart(v) => v.iter().map(OrgNode::headcount).sum(),
            PageData::Audit(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub page: Page,
    pub data: PageData,
    pub actions: Vec<(&'static Affordance, UiState)>,
    pub loaded_at: DateTime<Utc>,
}

impl PageSnapshot {
    pub fn visible_actions(&self) -> impl Iterator<Item = &(&'static Affordance, UiState)> {
        self.actions.iter().filter(|(_, s)| *s != UiState::Hidden)
    }
}

/// Load one page. Restricted pages are refused locally before any request.
pub async fn navigate(
    client: &ApiClient,
    gate: &PermissionGate,
    page: Page,
) -> AgentloomResult<PageSnapshot> {
    if let Some(permission) = page.required_permission() {
        gate.permissions().require(permission)?;
    }
    debug!(page = %page, "Loading page");

    let data = match &page {
        Page::Dashboard => PageData::Dashboard(load_dashboard(client).await?),
        Page::Agents => PageData::Agents(client.agents().list().await?),
        Page::Tools => PageData::Tools(client.tools().list().await?),
        Page::Knowledge => PageData::Knowledge(client.knowledge().bases().await?),
        Page::Documents { tool_id } => {
            PageData::Documents(client.knowledge().documents(tool_id).await?)
        }
        Page::Conversations { agent_id } => {
            PageData::Conversations(client.agents().conversations(agent_id).await?)
        }
        Page::Approvals => PageData::Approvals(client.approvals().pending().await?),
        Page::Users => PageData::Users(client.security().users().await?),
        Page::Roles => PageData::Roles(client.security().roles().await?),
        Page::Groups => PageData::Groups(client.security().groups().await?),
        Page::OrgChart => PageData::OrgChart(client.security().org_chart().await?),
        Page::Audit(query) => PageData::Audit(client.security().audit_log(query).await?),
    };

    let actions = page
        .affordances()
        .into_iter()
        .map(|a| (a, gate.state_of(a)))
        .collect();

    Ok(PageSnapshot {
        page,
        data,
        actions,
        loaded_at: Utc::now(),
    })
}

async fn load_dashboard(client: &ApiClient) -> AgentloomResult<DashboardSummary> {
    let agents = client.agents().list().await?;
    let tools = client.tools().list().await?;
    let pending_approvals = match client.approvals().pending().await {
        Ok(list) => Some(list.len()),
        Err(e) => {
            warn!("Approvals unavailable for dashboard: {}", e);
            None
        }
    };

    let mut recent = agents.clone();
    recent.sort_by(|a, b| b.updated_at.or(b.created_at).cmp(&a.updated_at.or(a.created_at)));
    recent.truncate(RECENT_AGENTS);

    Ok(DashboardSummary {
        agent_count: agents.len(),
        published_agents: agents.iter().filter(|a| a.is_published()).count(),
        tool_count: tools.len(),
        pending_approvals,
        recent_agents: recent,
    })
}
