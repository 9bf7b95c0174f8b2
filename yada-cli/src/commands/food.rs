use clap::{Args, Subcommand, ValueEnum};
use yada_core::models::{format_amount, join_attributes};
use yada_core::{
    Attribute, CompositeBuilder, DiaryError, DiaryStore, Food, FoodCatalog, FoodId, FoodKind,
    Session,
};

use super::{check_text, OutputFormat};

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Basic,
    Composite,
}

impl From<KindArg> for FoodKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Basic => FoodKind::Basic,
            KindArg::Composite => FoodKind::Composite,
        }
    }
}

#[derive(Args)]
pub struct FoodCommand {
    #[command(subcommand)]
    pub command: FoodSubcommand,
}

#[derive(Subcommand)]
pub enum FoodSubcommand {
    /// Add a basic food with a fixed calorie count
    AddBasic {
        /// Food name (must be unique)
        name: String,

        /// Calories per serving
        #[arg(long, short)]
        calories: f64,

        /// Search keyword (can be repeated)
        #[arg(long = "keyword", short = 'k', value_name = "KEYWORD")]
        keywords: Vec<String>,

        /// Extra nutrition info as FIELD=VALUE:UNIT (can be repeated)
        #[arg(long = "attr", short = 'a', value_name = "FIELD=VALUE:UNIT")]
        attributes: Vec<String>,
    },

    /// Add a composite food built from saved foods
    AddComposite {
        /// Food name (must be unique)
        name: String,

        /// Component as ID_OR_NAME[:SERVINGS] (can be repeated)
        #[arg(long = "component", short = 'c', value_name = "FOOD[:SERVINGS]", required = true)]
        components: Vec<String>,

        /// Search keyword (can be repeated)
        #[arg(long = "keyword", short = 'k', value_name = "KEYWORD")]
        keywords: Vec<String>,
    },

    /// List foods
    List {
        /// Only list one category
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Search saved foods by keyword
    Search {
        /// Keywords to look for
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Require every keyword instead of any
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a food by ID or name
    Show {
        /// Food ID or name
        food: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl FoodCommand {
    /// Whether the command changes the diary.
    pub fn modifies(&self) -> bool {
        matches!(
            self.command,
            FoodSubcommand::AddBasic { .. } | FoodSubcommand::AddComposite { .. }
        )
    }

    pub fn run<S: DiaryStore>(
        &self,
        session: &mut Session<S>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            FoodSubcommand::AddBasic {
                name,
                calories,
                keywords,
                attributes,
            } => add_basic(session, name, *calories, keywords, attributes),
            FoodSubcommand::AddComposite {
                name,
                components,
                keywords,
            } => add_composite(session, name, components, keywords),
            FoodSubcommand::List { kind, format } => {
                let kinds = match kind {
                    Some(kind) => vec![FoodKind::from(*kind)],
                    None => FoodKind::ALL.to_vec(),
                };
                let catalog = &session.diary().catalog;
                let foods: Vec<&Food> = kinds.iter().flat_map(|k| catalog.foods(*k)).collect();
                print_foods(&foods, format, "No foods found.")
            }
            FoodSubcommand::Search {
                keywords,
                all,
                format,
            } => {
                let foods = session.diary().catalog.search(keywords, *all);
                print_foods(&foods, format, "No matching foods found.")
            }
            FoodSubcommand::Show { food, format } => {
                let catalog = &session.diary().catalog;
                let food = catalog
                    .resolve(food)
                    .ok_or_else(|| format!("Food not found: {}", food))?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(food)?),
                    OutputFormat::Text => print_food_details(food, catalog),
                }
                Ok(())
            }
        }
    }
}

fn check_new_food<S: DiaryStore>(
    session: &Session<S>,
    name: &str,
    keywords: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    check_text("Name", name)?;
    for keyword in keywords {
        check_text("Keyword", keyword)?;
    }
    if let Some(existing) = session.diary().catalog.find_by_name(name.trim()) {
        return Err(DiaryError::DuplicateName(existing.name.clone()).into());
    }
    Ok(())
}

fn add_basic<S: DiaryStore>(
    session: &mut Session<S>,
    name: &str,
    calories: f64,
    keywords: &[String],
    attributes: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    check_new_food(session, name, keywords)?;
    if !calories.is_finite() || calories < 0.0 {
        return Err(format!("Invalid calories: {}", calories).into());
    }
    let attributes = attributes
        .iter()
        .map(|a| {
            check_text("Attribute", a)?;
            a.parse::<Attribute>().map_err(|e| e.to_string())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let id = session.allocate_id(FoodKind::Basic)?;
    let food = Food::basic(id, name.trim(), calories)
        .with_keywords(keywords)
        .with_extra_info(join_attributes(&attributes));
    let description = session.add_food(food)?;
    println!("Done: {}", description);
    Ok(())
}

/// Splits `FOOD[:SERVINGS]`; servings default to one.
fn parse_component(spec: &str) -> Result<(&str, f64), String> {
    match spec.rsplit_once(':') {
        Some((food, servings)) => {
            let servings = servings
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid servings in component '{}'", spec))?;
            Ok((food.trim(), servings))
        }
        None => Ok((spec.trim(), 1.0)),
    }
}

fn build_composite<S: DiaryStore>(
    session: &Session<S>,
    id: &FoodId,
    name: &str,
    components: &[String],
) -> Result<Food, Box<dyn std::error::Error>> {
    let catalog = &session.diary().catalog;
    let mut builder = CompositeBuilder::new(catalog);
    for spec in components {
        let (reference, servings) = parse_component(spec)?;
        let food = catalog
            .resolve(reference)
            .ok_or_else(|| DiaryError::NotFound(format!("food {}", reference)))?;
        builder.add(&food.id, servings)?;
    }
    Ok(builder.build(id.clone(), name))
}

fn add_composite<S: DiaryStore>(
    session: &mut Session<S>,
    name: &str,
    components: &[String],
    keywords: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    check_new_food(session, name, keywords)?;

    let id = session.allocate_id(FoodKind::Composite)?;
    let food = match build_composite(session, &id, name.trim(), components) {
        Ok(food) => food.with_keywords(keywords),
        Err(e) => {
            session.release_id(&id);
            return Err(e);
        }
    };
    let description = session.add_food(food)?;
    println!("Done: {}", description);
    Ok(())
}

fn print_foods(
    foods: &[&Food],
    format: &OutputFormat,
    empty: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(foods)?),
        OutputFormat::Text => {
            if foods.is_empty() {
                println!("{}", empty);
            }
            for food in foods {
                println!("{}", food);
            }
        }
    }
    Ok(())
}

fn print_food_details(food: &Food, catalog: &FoodCatalog) {
    println!("{} ({})", food.name, food.id);
    println!("  Type: {}", food.kind());
    println!("  Calories: {}", format_amount(food.calories()));
    if !food.keywords.is_empty() {
        println!("  Keywords: {}", food.keywords.join(", "));
    }
    let attributes = food.attributes();
    if !attributes.is_empty() {
        println!("  Extra info:");
        for attr in attributes {
            println!("    {}", attr);
        }
    }
    if !food.components().is_empty() {
        println!("  Components:");
        for component in food.components() {
            let name = catalog
                .get(&component.food_id)
                .map_or("?", |f| f.name.as_str());
            println!("    {} {}", component, name);
        }
    }
    if !food.committed {
        println!("  (unsaved)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;
    use yada_core::TextStore;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: FoodSubcommand,
    }

    fn parse(args: &[&str]) -> FoodCommand {
        let cli = TestCli::parse_from(std::iter::once("food").chain(args.iter().copied()));
        FoodCommand {
            command: cli.command,
        }
    }

    #[test]
    fn test_parse_component() {
        assert_eq!(parse_component("B1:2").unwrap(), ("B1", 2.0));
        assert_eq!(parse_component("Bread").unwrap(), ("Bread", 1.0));
        assert!(parse_component("B1:lots").is_err());
    }

    #[test]
    fn test_add_basic_and_composite() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(TextStore::new(temp.path())).unwrap();

        parse(&["add-basic", "Bread", "-c", "100", "-a", "protein=5:g"])
            .run(&mut session)
            .unwrap();
        parse(&["add-basic", "Cheese", "-c", "50", "-a", "protein=3:g", "-k", "dairy"])
            .run(&mut session)
            .unwrap();

        // Components must be saved first.
        let composite = parse(&["add-composite", "Sandwich", "-c", "B1:2", "-c", "cheese"]);
        assert!(composite.run(&mut session).is_err());
        let unused = session.allocate_id(FoodKind::Composite).unwrap();
        assert_eq!(unused.as_str(), "C1");
        session.release_id(&unused);

        session.save().unwrap();
        composite.run(&mut session).unwrap();
        let sandwich = session.diary().catalog.find_by_name("sandwich").unwrap();
        assert_eq!(sandwich.id.as_str(), "C1");
        assert_eq!(sandwich.calories(), 250.0);
        assert_eq!(sandwich.extra_info, "protein=13:g");
    }

    #[test]
    fn test_add_basic_rejects_bad_input() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(TextStore::new(temp.path())).unwrap();

        assert!(parse(&["add-basic", "A;B", "-c", "1"]).run(&mut session).is_err());
        assert!(parse(&["add-basic", "Apple", "-c", "1", "-a", "oops"])
            .run(&mut session)
            .is_err());
        parse(&["add-basic", "Apple", "-c", "95"])
            .run(&mut session)
            .unwrap();
        assert!(parse(&["add-basic", "APPLE", "-c", "95"])
            .run(&mut session)
            .is_err());
        assert_eq!(session.diary().catalog.len(), 1);
        assert!(parse(&["add-basic", "x", "-c", "1"]).modifies());
        assert!(!parse(&["list"]).modifies());
    }

    #[test]
    fn test_add_basic_rejects_separators_in_attributes() {
        let temp = TempDir::new().unwrap();
        let mut session = Session::open(TextStore::new(temp.path())).unwrap();

        for attr in ["protein=5:g|fat", "pro;tein=5:g", "protein=5:g;x"] {
            assert!(parse(&["add-basic", "Bread", "-c", "100", "-a", attr])
                .run(&mut session)
                .is_err());
        }
        assert!(session.diary().catalog.is_empty());

        parse(&["add-basic", "Bread", "-c", "100", "-a", "protein=5:g", "-a", "salt=0.4:g"])
            .run(&mut session)
            .unwrap();
        let bread = session.diary().catalog.find_by_name("bread").unwrap();
        assert_eq!(bread.extra_info, "protein=5:g|salt=0.4:g");
    }
}
