//! Row-level security for the portal's tables and bucket
//!
//! The admin flag checked by the portal only decides what is shown. These
//! policies are what actually keeps patients to their own reports and keeps
//! uploads to admins; apply the rendered script to the project database.

use std::fmt;

use crate::config::LabOptions;

/// The SQL command type for an RLS policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RlsCommand {
    Select,
    Insert,
    Update,
}

impl fmt::Display for RlsCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RlsCommand::Select => write!(f, "SELECT"),
            RlsCommand::Insert => write!(f, "INSERT"),
            RlsCommand::Update => write!(f, "UPDATE"),
        }
    }
}

/// One `CREATE POLICY` statement
#[derive(Debug, Clone)]
pub struct RlsPolicy {
    pub name: String,
    /// Schema-qualified table, e.g. `public.reports`
    pub table: String,
    pub command: RlsCommand,
    /// Role the policy applies to
    pub role: &'static str,
    /// `USING` clause; not allowed for INSERT
    pub using: Option<String>,
    /// `WITH CHECK` clause
    pub check: Option<String>,
}

impl RlsPolicy {
    /// Generates the `CREATE POLICY` SQL statement
    pub fn create_policy_sql(&self) -> String {
        let using = self
            .using
            .as_ref()
            .map_or(String::new(), |u| format!(" USING ({})", u));
        let check = self
            .check
            .as_ref()
            .map_or(String::new(), |c| format!(" WITH CHECK ({})", c));

        format!(
            "CREATE POLICY \"{}\" ON {} FOR {} TO {}{}{};",
            self.name, self.table, self.command, self.role, using, check
        )
    }

    /// Generates the `DROP POLICY` SQL statement
    pub fn drop_policy_sql(&self) -> String {
        format!("DROP POLICY IF EXISTS \"{}\" ON {};", self.name, self.table)
    }
}

fn policy(name: &str, table: &str, command: RlsCommand, using: Option<String>, check: Option<String>) -> RlsPolicy {
    RlsPolicy {
        name: name.to_string(),
        table: table.to_string(),
        command,
        role: "authenticated",
        using,
        check,
    }
}

/// Policies for the configured users table, reports table and bucket
pub fn lab_policies(options: &LabOptions) -> Vec<RlsPolicy> {
    let users = format!("public.{}", options.users_table);
    let reports = format!("public.{}", options.reports_table);
    let bucket = options.reports_bucket.replace('\'', "''");

    let own_row = "uid = auth.uid()::text".to_string();
    let is_admin = format!(
        "EXISTS (SELECT 1 FROM {} u WHERE u.uid = auth.uid()::text AND u.is_admin)",
        users
    );
    let not_admin_flag = "uid = auth.uid()::text AND is_admin = false".to_string();

    vec![
        policy("users: read own profile", &users, RlsCommand::Select, Some(own_row.clone()), None),
        policy("users: create own profile", &users, RlsCommand::Insert, None, Some(not_admin_flag.clone())),
        policy("users: update own profile", &users, RlsCommand::Update, Some(own_row), Some(not_admin_flag)),
        policy(
            "reports: read own reports",
            &reports,
            RlsCommand::Select,
            Some(format!(
                "phone IN (SELECT u.phone FROM {} u WHERE u.uid = auth.uid()::text) OR {}",
                users, is_admin
            )),
            None,
        ),
        policy("reports: admins add reports", &reports, RlsCommand::Insert, None, Some(is_admin.clone())),
        policy(
            "storage: admins upload reports",
            "storage.objects",
            RlsCommand::Insert,
            None,
            Some(format!("bucket_id = '{}' AND {}", bucket, is_admin)),
        ),
    ]
}

/// Executable script: enable RLS, then drop and recreate every policy
pub fn render_script(options: &LabOptions) -> String {
    let mut lines = vec![
        format!("ALTER TABLE public.{} ENABLE ROW LEVEL SECURITY;", options.users_table),
        format!("ALTER TABLE public.{} ENABLE ROW LEVEL SECURITY;", options.reports_table),
    ];

    for policy in lab_policies(options) {
        lines.push(policy.drop_policy_sql());
        lines.push(policy.create_policy_sql());
    }

    lines.join("\n") + "\n"
}
