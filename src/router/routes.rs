use serde::Serialize;
use url::form_urlencoded;

/// Access requirements and page metadata attached to a route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requires_auth: bool,
    pub guest_only: bool,
    pub permission: Option<String>,
    pub requires_verified_email: bool,
    pub requires_complete_profile: bool,
}

impl RouteMeta {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn guest(mut self) -> Self {
        self.guest_only = true;
        self
    }

    pub fn permission(mut self, permission: &str) -> Self {
        self.permission = Some(permission.to_string());
        self
    }

    pub fn verified_email(mut self) -> Self {
        self.requires_verified_email = true;
        self
    }

    pub fn complete_profile(mut self) -> Self {
        self.requires_complete_profile = true;
        self
    }

    /// Permission, verified-email and complete-profile checks all imply a
    /// logged-in user
    pub fn needs_authentication(&self) -> bool {
        self.requires_auth
            || self.permission.is_some()
            || self.requires_verified_email
            || self.requires_complete_profile
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub name: String,
    pub path: String,
    pub meta: RouteMeta,
}

impl Route {
    pub fn new(name: &str, path: &str, meta: RouteMeta) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            meta,
        }
    }
}

/// A resolved navigation target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub query: Vec<(String, String)>,
    pub meta: RouteMeta,
}

impl Target {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Open,
    Guest,
    Auth,
}

const PAGES: &[(&str, &str, Access, &str, &str)] = &[
    (
        "Home",
        "/",
        Access::Open,
        "Agente Investidor - Inteligência Artificial para Investimentos",
        "Plataforma de investimentos com IA avançada",
    ),
    (
        "Login",
        "/login",
        Access::Guest,
        "Login - Agente Investidor",
        "Faça login na sua conta",
    ),
    (
        "Cadastro",
        "/cadastro",
        Access::Guest,
        "Cadastro - Agente Investidor",
        "Crie sua conta gratuita",
    ),
    (
        "Dashboard",
        "/dashboard",
        Access::Auth,
        "Dashboard - Agente Investidor",
        "Painel de controle dos seus investimentos",
    ),
    (
        "Portfolio",
        "/portfolio",
        Access::Auth,
        "Portfólio - Agente Investidor",
        "Visualize e gerencie seu portfólio",
    ),
    (
        "Analises",
        "/analises",
        Access::Auth,
        "Análises IA - Agente Investidor",
        "Análises inteligentes dos seus investimentos",
    ),
    (
        "Metodologias",
        "/metodologias",
        Access::Auth,
        "Metodologias - Agente Investidor",
        "Metodologias de investimento com IA",
    ),
    (
        "Corretoras",
        "/corretoras",
        Access::Auth,
        "Corretoras - Agente Investidor",
        "Conecte e gerencie suas corretoras",
    ),
    (
        "Relatorios",
        "/relatorios",
        Access::Auth,
        "Relatórios - Agente Investidor",
        "Relatórios detalhados dos seus investimentos",
    ),
    (
        "Configuracoes",
        "/configuracoes",
        Access::Auth,
        "Configurações - Agente Investidor",
        "Configure sua conta e preferências",
    ),
    (
        "Perfil",
        "/perfil",
        Access::Auth,
        "Perfil - Agente Investidor",
        "Gerencie seu perfil de usuário",
    ),
    (
        "EmailVerification",
        "/verificar-email",
        Access::Auth,
        "Verificar Email - Agente Investidor",
        "Confirme seu endereço de email",
    ),
    (
        "ProfileSetup",
        "/completar-perfil",
        Access::Auth,
        "Completar Perfil - Agente Investidor",
        "Complete seu cadastro para continuar",
    ),
    (
        "Ajuda",
        "/ajuda",
        Access::Open,
        "Ajuda - Agente Investidor",
        "Central de ajuda e suporte",
    ),
    (
        "Sobre",
        "/sobre",
        Access::Open,
        "Sobre - Agente Investidor",
        "Conheça mais sobre nossa plataforma",
    ),
    (
        "Termos",
        "/termos",
        Access::Open,
        "Termos de Uso - Agente Investidor",
        "Termos de uso da plataforma",
    ),
    (
        "Privacidade",
        "/privacidade",
        Access::Open,
        "Política de Privacidade - Agente Investidor",
        "Nossa política de privacidade",
    ),
    (
        "Maintenance",
        "/manutencao",
        Access::Open,
        "Manutenção - Agente Investidor",
        "Sistema em manutenção",
    ),
    (
        "Forbidden",
        "/403",
        Access::Open,
        "Acesso Negado - Agente Investidor",
        "Você não tem permissão para acessar esta página",
    ),
    (
        "Error500",
        "/500",
        Access::Open,
        "Erro Interno - Agente Investidor",
        "Erro interno do servidor",
    ),
];

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: Route,
}

impl RouteTable {
    /// Table with a catch-all route for unmatched paths
    pub fn new(routes: Vec<Route>, fallback: Route) -> Self {
        Self { routes, fallback }
    }

    /// The platform's page map
    pub fn standard() -> Self {
        let routes = PAGES
            .iter()
            .map(|&(name, path, access, title, description)| {
                let meta = RouteMeta::new(title, description);
                let meta = match access {
                    Access::Open => meta,
                    Access::Guest => meta.guest(),
                    Access::Auth => meta.auth(),
                };
                Route::new(name, path, meta)
            })
            .collect();

        let fallback = Route::new(
            "Error404",
            "/404",
            RouteMeta::new(
                "Página não encontrada - Agente Investidor",
                "A página que você procura não foi encontrada",
            ),
        );

        Self::new(routes, fallback)
    }

    /// Replace the route with the same name, or append it
    pub fn with_route(mut self, route: Route) -> Self {
        match self.routes.iter_mut().find(|r| r.name == route.name) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
        self
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.routes
            .iter()
            .chain(std::iter::once(&self.fallback))
            .find(|r| r.name == name)
    }

    /// Match a location string (path, optional query and fragment) to a route
    pub fn resolve(&self, full_path: &str) -> Target {
        let without_fragment = full_path.split('#').next().unwrap_or(full_path);
        let (raw_path, raw_query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };
        let path = normalize(raw_path);

        let query: Vec<(String, String)> = raw_query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let route = self
            .routes
            .iter()
            .find(|r| r.path == path)
            .unwrap_or(&self.fallback);

        Target {
            name: route.name.clone(),
            path,
            full_path: full_path.to_string(),
            query,
            meta: route.meta.clone(),
        }
    }

    /// Location string for a named route with a query; `None` for unknown names
    pub fn href(&self, name: &str, query: &[(String, String)]) -> Option<String> {
        let route = self.by_name(name)?;
        if query.is_empty() {
            return Some(route.path.clone());
        }
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(query.iter())
            .finish();
        Some(format!("{}?{}", route.path, encoded))
    }
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
