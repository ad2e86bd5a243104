//! Built-in question templates and the values their placeholders draw from.

use PoolValue::{Number as N, Text as T};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PoolValue {
    Text(&'static str),
    Number(f64),
}

impl PoolValue {
    /// Text spliced into the question; whole numbers print without a
    /// fractional part.
    pub(crate) fn render(self) -> String {
        match self {
            Self::Text(text) => text.to_string(),
            Self::Number(value) if value.fract() == 0.0 => format!("{}", value as i64),
            Self::Number(value) => value.to_string(),
        }
    }

    pub(crate) fn to_json(self) -> serde_json::Value {
        match self {
            Self::Text(text) => serde_json::Value::from(text),
            Self::Number(value) if value.fract() == 0.0 => serde_json::Value::from(value as i64),
            Self::Number(value) => serde_json::Value::from(value),
        }
    }
}

pub(crate) type Pool = (&'static str, &'static [PoolValue]);

#[derive(Debug, Clone, Copy)]
pub(crate) struct SubjectBank {
    pub(crate) templates: &'static [&'static str],
    pub(crate) pools: &'static [Pool],
}

impl SubjectBank {
    pub(crate) fn pool(&self, key: &str) -> Option<&'static [PoolValue]> {
        self.pools.iter().find(|(name, _)| *name == key).map(|(_, values)| *values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Subject {
    Physics,
    Chemistry,
    Mathematics,
    Programming,
}

impl Subject {
    /// Unrecognised names use the physics bank.
    pub(crate) fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "chemistry" => Self::Chemistry,
            "mathematics" | "math" => Self::Mathematics,
            "programming" => Self::Programming,
            _ => Self::Physics,
        }
    }

    pub(crate) fn bank(self) -> &'static SubjectBank {
        match self {
            Self::Physics => &PHYSICS,
            Self::Chemistry => &CHEMISTRY,
            Self::Mathematics => &MATHEMATICS,
            Self::Programming => &PROGRAMMING,
        }
    }
}

static PHYSICS: SubjectBank = SubjectBank {
    templates: &[
        "Calculate the {measurement} of a {object} with {property1} = {value1} {unit1} and {property2} = {value2} {unit2}",
        "A {system} has {component1} = {value1} {unit1} and {component2} = {value2} {unit2}. Find the {target_measurement}",
        "In an experiment involving {phenomenon}, if {variable1} = {value1} and {variable2} = {value2}, determine the {result}",
    ],
    pools: &[
        ("measurement", &[T("force"), T("velocity"), T("acceleration"), T("energy"), T("momentum"), T("power")]),
        ("object", &[T("pendulum"), T("projectile"), T("spring"), T("circuit"), T("wave"), T("particle")]),
        ("property1", &[T("mass"), T("length"), T("time"), T("voltage"), T("current"), T("frequency")]),
        ("property2", &[T("height"), T("angle"), T("resistance"), T("capacitance"), T("wavelength"), T("amplitude")]),
        ("value1", &[N(10.0), N(15.0), N(20.0), N(25.0), N(30.0), N(35.0), N(40.0), N(45.0), N(50.0)]),
        ("value2", &[N(2.5), N(3.0), N(3.5), N(4.0), N(4.5), N(5.0), N(5.5), N(6.0)]),
        ("unit1", &[T("kg"), T("m"), T("s"), T("V"), T("A"), T("Hz")]),
        ("unit2", &[T("m"), T("degrees"), T("Ω"), T("F"), T("cm")]),
        ("system", &[T("circuit"), T("pendulum system"), T("spring system"), T("wave system")]),
        ("component1", &[T("voltage"), T("mass"), T("spring constant"), T("frequency")]),
        ("component2", &[T("current"), T("length"), T("displacement"), T("wavelength")]),
        ("target_measurement", &[T("power"), T("period"), T("energy"), T("velocity")]),
        ("phenomenon", &[T("wave motion"), T("projectile motion"), T("circular motion"), T("harmonic motion")]),
        ("variable1", &[T("frequency"), T("mass"), T("voltage"), T("time")]),
        ("variable2", &[T("wavelength"), T("height"), T("resistance"), T("distance")]),
        ("result", &[T("velocity"), T("energy"), T("power"), T("momentum")]),
    ],
};

static CHEMISTRY: SubjectBank = SubjectBank {
    templates: &[
        "Calculate the {calculation_type} of {compound} when {condition1} = {value1} {unit1} and {condition2} = {value2} {unit2}",
        "In a reaction between {reactant1} and {reactant2}, if {parameter} = {value} {unit}, find the {product_property}",
        "A solution contains {substance} with {property} = {value} {unit}. Calculate the {target_value}",
    ],
    pools: &[
        ("calculation_type", &[T("molarity"), T("molality"), T("pH"), T("concentration"), T("yield"), T("equilibrium constant")]),
        ("compound", &[T("NaCl"), T("H2SO4"), T("CaCO3"), T("CH4"), T("C6H12O6"), T("NH3")]),
        ("condition1", &[T("temperature"), T("pressure"), T("volume"), T("amount"), T("concentration")]),
        ("condition2", &[T("time"), T("catalyst amount"), T("surface area"), T("pH"), T("ionic strength")]),
        ("value1", &[N(25.0), N(30.0), N(35.0), N(40.0), N(45.0), N(50.0), N(55.0), N(60.0)]),
        ("value2", &[N(1.0), N(1.5), N(2.0), N(2.5), N(3.0), N(3.5), N(4.0)]),
        ("unit1", &[T("°C"), T("atm"), T("L"), T("mol"), T("M")]),
        ("unit2", &[T("min"), T("g"), T("cm²"), T("units"), T("M")]),
        ("reactant1", &[T("HCl"), T("NaOH"), T("H2SO4"), T("CaCl2")]),
        ("reactant2", &[T("NaCl"), T("CaCO3"), T("NH3"), T("KOH")]),
        ("parameter", &[T("temperature"), T("concentration"), T("pressure")]),
        ("value", &[N(25.0), N(30.0), N(35.0), N(40.0), N(45.0)]),
        ("unit", &[T("°C"), T("M"), T("atm")]),
        ("product_property", &[T("yield"), T("concentration"), T("mass")]),
        ("substance", &[T("HCl"), T("NaOH"), T("H2SO4"), T("NH3")]),
        ("property", &[T("concentration"), T("volume"), T("mass")]),
        ("target_value", &[T("pH"), T("molarity"), T("mass")]),
    ],
};

static MATHEMATICS: SubjectBank = SubjectBank {
    templates: &[
        "Solve for {variable} when {equation_part1} = {value1} and {equation_part2} = {value2}",
        "A {geometric_shape} has {dimension1} = {value1} {unit} and {dimension2} = {value2} {unit}. Find the {calculation_target}",
        "Given the function f(x) = {function_type} where {parameter} = {value}, calculate {target}",
    ],
    pools: &[
        ("variable", &[T("x"), T("y"), T("z"), T("t"), T("n"), T("θ")]),
        ("geometric_shape", &[T("triangle"), T("circle"), T("rectangle"), T("parallelogram"), T("trapezoid"), T("ellipse")]),
        ("dimension1", &[T("length"), T("width"), T("radius"), T("height"), T("base"), T("side")]),
        ("dimension2", &[T("width"), T("height"), T("diameter"), T("angle"), T("altitude"), T("diagonal")]),
        ("value1", &[N(5.0), N(8.0), N(10.0), N(12.0), N(15.0), N(18.0), N(20.0), N(24.0)]),
        ("value2", &[N(3.0), N(4.0), N(6.0), N(7.0), N(9.0), N(11.0), N(14.0), N(16.0)]),
        ("unit", &[T("cm"), T("m"), T("mm"), T("inches")]),
        ("equation_part1", &[T("2x + 3"), T("x²"), T("log(x)"), T("sin(x)")]),
        ("equation_part2", &[T("5y - 1"), T("y + 4"), T("3z"), T("cos(y)")]),
        ("function_type", &[T("x² + 2x"), T("sin(x)"), T("e^x"), T("log(x)")]),
        ("parameter", &[T("a"), T("b"), T("c"), T("k")]),
        ("target", &[T("f(2)"), T("f'(x)"), T("maximum"), T("minimum")]),
        ("calculation_target", &[T("area"), T("perimeter"), T("volume"), T("surface area")]),
    ],
};

static PROGRAMMING: SubjectBank = SubjectBank {
    templates: &[
        "Write a {language} function that {task} with input parameters {param_type} and returns {return_type}",
        "Debug the following {language} code that implements {algorithm} with {constraint} and {requirement}",
        "Design a {data_structure} that supports {operation1} and {operation2} with time complexity {complexity}",
    ],
    pools: &[
        ("language", &[T("Python"), T("Java"), T("JavaScript"), T("C++")]),
        ("task", &[T("sorts an array"), T("searches for elements"), T("calculates fibonacci"), T("reverses a string")]),
        ("param_type", &[T("integer array"), T("string"), T("number"), T("object")]),
        ("return_type", &[T("boolean"), T("integer"), T("string"), T("array")]),
        ("algorithm", &[T("binary search"), T("quick sort"), T("depth-first search"), T("breadth-first search")]),
        ("constraint", &[T("O(n log n) time complexity"), T("constant space"), T("recursive approach")]),
        ("requirement", &[T("handles edge cases"), T("validates input"), T("optimized performance")]),
        ("data_structure", &[T("binary tree"), T("hash table"), T("linked list"), T("stack")]),
        ("operation1", &[T("insert"), T("search"), T("delete"), T("traverse")]),
        ("operation2", &[T("update"), T("find minimum"), T("find maximum"), T("size")]),
        ("complexity", &[T("O(1)"), T("O(log n)"), T("O(n)"), T("O(n log n)")]),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_placeholder_has_a_pool() {
        for subject in
            [Subject::Physics, Subject::Chemistry, Subject::Mathematics, Subject::Programming]
        {
            let bank = subject.bank();
            for template in bank.templates {
                for key in template.split('{').skip(1).filter_map(|rest| rest.split_once('}')) {
                    assert!(bank.pool(key.0).is_some(), "{subject:?} lacks pool for {}", key.0);
                }
            }
        }
    }

    #[test]
    fn unknown_subjects_fall_back_to_physics() {
        assert_eq!(Subject::from_name("Chemistry"), Subject::Chemistry);
        assert_eq!(Subject::from_name("astrology"), Subject::Physics);
    }

    #[test]
    fn numbers_render_like_the_question_text_expects() {
        assert_eq!(PoolValue::Number(3.0).render(), "3");
        assert_eq!(PoolValue::Number(2.5).render(), "2.5");
        assert_eq!(PoolValue::Number(3.0).to_json(), serde_json::json!(3));
        assert_eq!(PoolValue::Text("kg").render(), "kg");
    }
}
